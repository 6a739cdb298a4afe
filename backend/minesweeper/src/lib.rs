//! Minesweeper engine and the terminal front end built on it.
//!
//!
//!
//! # Game
//! - A board is a `rows x cols` grid with a fixed number of mines placed at creation
//! - Revealing a zero cell floods outwards until it hits numbered, flagged or revealed cells
//! - Revealing a mine loses and uncovers every mine
//! - Uncovering every safe cell wins
//! - The clock starts on the first reveal and freezes once the game ends
//!
//! Moves that make no sense (off the board, on a revealed cell, after the game ended) are
//! ignored rather than reported.
//!
//!
//!
//! # Difficulties
//!
//! | Name     | Rows | Cols | Mines |
//! |----------|------|------|-------|
//! | `easy`   | 9    | 9    | 10    |
//! | `medium` | 16   | 16   | 40    |
//! | `hard`   | 16   | 30   | 99    |
//!
//!
//!
//! # Terminal
//!
//! ```sh
//! cargo run -p minesweeper -- --difficulty medium
//! ```
//!
//! | Command | Effect |
//! |---------|--------|
//! | `r <row> <col>` | Reveal |
//! | `f <row> <col>` | Toggle flag |
//! | `n` | New game |
//! | `d <difficulty>` | New game at another difficulty |
//! | `q` | Quit |
use std::{fmt, str::FromStr};

pub mod board;
pub mod error;

pub use board::{Board, Cell, CellState, GameState};
pub use error::BoardError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn rows(self) -> usize {
        match self {
            Self::Easy => 9,
            Self::Medium | Self::Hard => 16,
        }
    }

    pub const fn cols(self) -> usize {
        match self {
            Self::Easy => 9,
            Self::Medium => 16,
            Self::Hard => 30,
        }
    }

    pub const fn mines(self) -> usize {
        match self {
            Self::Easy => 10,
            Self::Medium => 40,
            Self::Hard => 99,
        }
    }
}

impl FromStr for Difficulty {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(BoardError::UnknownDifficulty(other.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}
