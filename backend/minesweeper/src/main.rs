use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use minesweeper::{Board, Difficulty, GameState};
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    sync::Mutex,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

const HELP: &str = "Commands: r <row> <col> | f <row> <col> | n | d <easy|medium|hard> | q";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long, default_value_t = Difficulty::Easy)]
    difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reveal { row: usize, col: usize },
    Flag { row: usize, col: usize },
    New,
    Difficulty(Difficulty),
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("Empty command");
        };

        let command = match verb {
            "r" | "reveal" => {
                let (row, col) = coordinates(&mut words)?;
                Self::Reveal { row, col }
            }
            "f" | "flag" => {
                let (row, col) = coordinates(&mut words)?;
                Self::Flag { row, col }
            }
            "n" | "new" => Self::New,
            "d" | "difficulty" => Self::Difficulty(
                words
                    .next()
                    .context("Missing difficulty")?
                    .parse()?,
            ),
            "q" | "quit" => Self::Quit,
            other => bail!("Unknown command '{other}'"),
        };

        if words.next().is_some() {
            bail!("Too many arguments");
        }

        Ok(command)
    }
}

fn coordinates<'a>(words: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<(usize, usize)> {
    let row = words.next().context("Missing row")?;
    let col = words.next().context("Missing column")?;

    Ok((
        row.parse().with_context(|| format!("Invalid row '{row}'"))?,
        col.parse().with_context(|| format!("Invalid column '{col}'"))?,
    ))
}

/// Ticks the board once per second until aborted.
fn start_clock(board: Arc<Mutex<Board>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            board.lock().await.tick();
        }
    })
}

fn render(board: &Board, difficulty: Difficulty) {
    println!(
        "\n{difficulty} | mines left: {} | time: {}s",
        board.mines_remaining(),
        board.elapsed_seconds()
    );
    print!("{board}");

    match board.game_state() {
        GameState::Won => println!("You won! Press n for a new game."),
        GameState::Lost => println!("Game over! Press n for a new game."),
        GameState::Playing => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let mut difficulty = args.difficulty;

    info!("Starting {difficulty} game");
    let board = Arc::new(Mutex::new(Board::new(difficulty)));
    let clock = start_clock(Arc::clone(&board));

    println!("{HELP}");
    render(&*board.lock().await, difficulty);

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}\n{HELP}");
                continue;
            }
        };
        debug!("{command:?}");

        let mut board = board.lock().await;
        match command {
            Command::Reveal { row, col } => {
                if !board.reveal(row, col) {
                    println!("Nothing to reveal at ({row}, {col})");
                }
            }
            Command::Flag { row, col } => {
                if !board.toggle_flag(row, col) {
                    println!("Cannot flag ({row}, {col})");
                }
            }
            Command::New => *board = Board::new(difficulty),
            Command::Difficulty(next) => {
                difficulty = next;
                *board = Board::new(difficulty);
                info!("Switched to {difficulty}");
            }
            Command::Quit => break,
        }

        render(&board, difficulty);
    }

    clock.abort();
    info!("Session ended");

    Ok(())
}
