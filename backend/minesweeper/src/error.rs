use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board needs at least one row and one column, got {rows}x{cols}")]
    Empty { rows: usize, cols: usize },

    #[error("{mines} mines do not fit on {cells} cells")]
    TooManyMines { mines: usize, cells: usize },

    #[error("Mine at ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("Mine at ({row}, {col}) placed twice")]
    DuplicateMine { row: usize, col: usize },

    #[error("Unknown difficulty '{0}', expected easy, medium or hard")]
    UnknownDifficulty(String),
}
