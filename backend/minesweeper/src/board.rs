use std::fmt;

use rand::Rng;

use crate::{Difficulty, error::BoardError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Hidden,
    Revealed,
    Flagged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    is_mine: bool,
    adjacent_mines: u8,
    state: CellState,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    /// Always 0 for mines.
    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    fn symbol(&self) -> char {
        match self.state {
            CellState::Hidden => '#',
            CellState::Flagged => 'F',
            CellState::Revealed if self.is_mine => '*',
            CellState::Revealed if self.adjacent_mines == 0 => '.',
            CellState::Revealed => char::from(b'0' + self.adjacent_mines),
        }
    }
}

/// Row-major grid plus the bookkeeping of a single game.
///
/// Mine placement and adjacency counts are fixed at construction; only cell states,
/// the flag count, the game state and the clock change afterwards.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    cells: Vec<Cell>,
    flags: usize,
    state: GameState,
    elapsed_seconds: u64,
    timer_running: bool,
}

impl Board {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::place(
            difficulty.rows(),
            difficulty.cols(),
            difficulty.mines(),
            &mut rand::rng(),
        )
    }

    /// Scatters `mines` uniformly over the grid, resampling on collisions.
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        check_dimensions(rows, cols, mines)?;

        Ok(Self::place(rows, cols, mines, rng))
    }

    /// Board with mines at exactly the given coordinates.
    pub fn from_mines(rows: usize, cols: usize, mines: &[(usize, usize)]) -> Result<Self, BoardError> {
        check_dimensions(rows, cols, mines.len())?;

        let mut cells = vec![Cell::default(); rows * cols];
        for &(row, col) in mines {
            if row >= rows || col >= cols {
                return Err(BoardError::OutOfBounds { row, col });
            }

            let cell = &mut cells[row * cols + col];
            if cell.is_mine {
                return Err(BoardError::DuplicateMine { row, col });
            }
            cell.is_mine = true;
        }

        Ok(Self::with_cells(rows, cols, mines.len(), cells))
    }

    fn place<R: Rng + ?Sized>(rows: usize, cols: usize, mines: usize, rng: &mut R) -> Self {
        let mut cells = vec![Cell::default(); rows * cols];

        let mut placed = 0;
        while placed < mines {
            let cell = &mut cells[rng.random_range(0..rows * cols)];
            if !cell.is_mine {
                cell.is_mine = true;
                placed += 1;
            }
        }

        Self::with_cells(rows, cols, mines, cells)
    }

    fn with_cells(rows: usize, cols: usize, mines: usize, mut cells: Vec<Cell>) -> Self {
        for row in 0..rows {
            for col in 0..cols {
                if cells[row * cols + col].is_mine {
                    continue;
                }

                let count = neighbors(rows, cols, row, col)
                    .filter(|&(r, c)| cells[r * cols + c].is_mine)
                    .count();
                cells[row * cols + col].adjacent_mines = count as u8;
            }
        }

        Self {
            rows,
            cols,
            mines,
            cells,
            flags: 0,
            state: GameState::Playing,
            elapsed_seconds: 0,
            timer_running: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mine_total(&self) -> usize {
        self.mines
    }

    pub fn flag_count(&self) -> usize {
        self.flags
    }

    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer_running
    }

    /// Mines minus flags. Goes negative when over-flagged.
    pub fn mines_remaining(&self) -> i64 {
        self.mines as i64 - self.flags as i64
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Returns whether the move changed anything.
    pub fn reveal(&mut self, row: usize, col: usize) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Some(target) = self.index(row, col) else {
            return false;
        };
        if self.cells[target].state != CellState::Hidden {
            return false;
        }

        self.timer_running = true;

        if self.cells[target].is_mine {
            for cell in self.cells.iter_mut().filter(|cell| cell.is_mine) {
                cell.state = CellState::Revealed;
            }
            self.finish(GameState::Lost);
            return true;
        }

        let mut pending = vec![(row, col)];
        while let Some((r, c)) = pending.pop() {
            let cell = &mut self.cells[r * self.cols + c];
            if cell.state != CellState::Hidden || cell.is_mine {
                continue;
            }

            cell.state = CellState::Revealed;
            if cell.adjacent_mines == 0 {
                pending.extend(neighbors(self.rows, self.cols, r, c));
            }
        }

        // Flagged safe cells do not block a win.
        let hidden_safe = self
            .cells
            .iter()
            .any(|cell| !cell.is_mine && cell.state == CellState::Hidden);
        if !hidden_safe {
            self.finish(GameState::Won);
        }

        true
    }

    /// Cycles hidden and flagged. Returns whether the move changed anything.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Some(index) = self.index(row, col) else {
            return false;
        };

        let cell = &mut self.cells[index];
        match cell.state {
            CellState::Hidden => {
                cell.state = CellState::Flagged;
                self.flags += 1;
            }
            CellState::Flagged => {
                cell.state = CellState::Hidden;
                self.flags -= 1;
            }
            CellState::Revealed => return false,
        }

        true
    }

    /// Advances the clock by one second while a started game is in progress.
    pub fn tick(&mut self) {
        if self.timer_running && self.state == GameState::Playing {
            self.elapsed_seconds += 1;
        }
    }

    fn finish(&mut self, state: GameState) {
        self.state = state;
        self.timer_running = false;
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.cols {
            write!(f, "{col:>3}")?;
        }
        writeln!(f)?;

        for (row, cells) in self.cells.chunks(self.cols).enumerate() {
            write!(f, "{row:>3}")?;
            for cell in cells {
                write!(f, "{:>3}", cell.symbol())?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

fn check_dimensions(rows: usize, cols: usize, mines: usize) -> Result<(), BoardError> {
    if rows == 0 || cols == 0 {
        return Err(BoardError::Empty { rows, cols });
    }
    if mines >= rows * cols {
        return Err(BoardError::TooManyMines {
            mines,
            cells: rows * cols,
        });
    }

    Ok(())
}

/// In-bounds neighbours of a cell, up to 8.
fn neighbors(
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> impl Iterator<Item = (usize, usize)> {
    (-1isize..=1)
        .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
        .filter(|&offset| offset != (0, 0))
        .filter_map(move |(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < rows && c < cols).then_some((r, c))
        })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn positions(board: &Board) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..board.rows()).flat_map(move |r| (0..board.cols()).map(move |c| (r, c)))
    }

    fn count_mines(board: &Board) -> usize {
        positions(board)
            .filter(|&(r, c)| board.cell(r, c).unwrap().is_mine())
            .count()
    }

    #[test]
    fn generate_places_exact_mines_and_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::generate(16, 30, 99, &mut rng).unwrap();

        assert_eq!(count_mines(&board), 99);
        assert_eq!(board.mine_total(), 99);
        assert_eq!(board.game_state(), GameState::Playing);

        for (r, c) in positions(&board) {
            let cell = board.cell(r, c).unwrap();
            assert_eq!(cell.state(), CellState::Hidden);
            if cell.is_mine() {
                continue;
            }

            let expected = neighbors(16, 30, r, c)
                .filter(|&(nr, nc)| board.cell(nr, nc).unwrap().is_mine())
                .count();
            assert_eq!(cell.adjacent_mines() as usize, expected, "cell ({r}, {c})");
        }
    }

    #[test]
    fn generate_is_deterministic_for_a_seed() {
        let first = Board::generate(9, 9, 10, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = Board::generate(9, 9, 10, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(first.cells, second.cells);
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            Board::generate(0, 9, 1, &mut rng).unwrap_err(),
            BoardError::Empty { rows: 0, cols: 9 }
        );
        assert_eq!(
            Board::generate(3, 3, 9, &mut rng).unwrap_err(),
            BoardError::TooManyMines { mines: 9, cells: 9 }
        );
        assert_eq!(
            Board::from_mines(3, 3, &[(3, 0)]).unwrap_err(),
            BoardError::OutOfBounds { row: 3, col: 0 }
        );
        assert_eq!(
            Board::from_mines(3, 3, &[(1, 1), (1, 1)]).unwrap_err(),
            BoardError::DuplicateMine { row: 1, col: 1 }
        );
    }

    #[test]
    fn neighbors_respect_edges() {
        assert_eq!(neighbors(9, 9, 0, 0).count(), 3);
        assert_eq!(neighbors(9, 9, 0, 4).count(), 5);
        assert_eq!(neighbors(9, 9, 4, 4).count(), 8);
        assert_eq!(neighbors(1, 1, 0, 0).count(), 0);
    }

    #[test]
    fn flood_fill_stops_at_numbers_and_never_reveals_mines() {
        let mut tested = 0;

        for seed in 0..20 {
            let mut board = Board::generate(9, 9, 10, &mut StdRng::seed_from_u64(seed)).unwrap();
            let Some((row, col)) = positions(&board).find(|&(r, c)| {
                let cell = board.cell(r, c).unwrap();
                !cell.is_mine() && cell.adjacent_mines() == 0
            }) else {
                continue;
            };

            assert!(board.reveal(row, col));
            tested += 1;

            for (r, c) in positions(&board) {
                let cell = board.cell(r, c).unwrap();
                if cell.state() != CellState::Revealed {
                    continue;
                }

                assert!(!cell.is_mine(), "flood revealed a mine at ({r}, {c})");
                if cell.adjacent_mines() == 0 {
                    for (nr, nc) in neighbors(9, 9, r, c) {
                        assert_eq!(board.cell(nr, nc).unwrap().state(), CellState::Revealed);
                    }
                }
            }
            assert_ne!(board.game_state(), GameState::Lost);
        }

        assert!(tested > 0);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        // # 1 . F .
        let mut board = Board::from_mines(1, 5, &[(0, 0)]).unwrap();
        assert!(board.toggle_flag(0, 3));

        assert!(board.reveal(0, 4));

        assert_eq!(board.cell(0, 4).unwrap().state(), CellState::Revealed);
        assert_eq!(board.cell(0, 3).unwrap().state(), CellState::Flagged);
        assert_eq!(board.cell(0, 2).unwrap().state(), CellState::Hidden);
        assert_eq!(board.game_state(), GameState::Playing);
    }

    #[test]
    fn revealing_every_safe_cell_wins() {
        let mines = [(0, 0), (2, 3), (3, 1)];
        let mut board = Board::from_mines(4, 4, &mines).unwrap();

        let safe: Vec<_> = positions(&board)
            .filter(|position| !mines.contains(position))
            .collect();
        for (r, c) in safe {
            board.reveal(r, c);
        }

        assert_eq!(board.game_state(), GameState::Won);
        assert!(!board.is_timer_running());
        for &(r, c) in &mines {
            assert_eq!(board.cell(r, c).unwrap().state(), CellState::Hidden);
        }
    }

    #[test]
    fn single_flood_can_win() {
        let mut board = Board::from_mines(3, 3, &[(0, 0)]).unwrap();

        assert!(board.reveal(2, 2));

        assert_eq!(board.game_state(), GameState::Won);
        assert_eq!(board.cell(1, 1).unwrap().adjacent_mines(), 1);
    }

    #[test]
    fn flagged_safe_cells_do_not_block_a_win() {
        let mut board = Board::from_mines(1, 3, &[(0, 0)]).unwrap();
        board.toggle_flag(0, 1);

        assert!(board.reveal(0, 2));

        assert_eq!(board.game_state(), GameState::Won);
        assert_eq!(board.cell(0, 1).unwrap().state(), CellState::Flagged);
    }

    #[test]
    fn revealing_a_mine_loses_and_shows_every_mine() {
        let mines = [(0, 0), (1, 2), (2, 1)];
        let mut board = Board::from_mines(3, 3, &mines).unwrap();
        board.toggle_flag(1, 2);

        assert!(board.reveal(0, 0));

        assert_eq!(board.game_state(), GameState::Lost);
        for &(r, c) in &mines {
            assert_eq!(board.cell(r, c).unwrap().state(), CellState::Revealed);
        }

        assert!(!board.reveal(2, 2));
        assert!(!board.toggle_flag(2, 2));
        assert_eq!(board.cell(2, 2).unwrap().state(), CellState::Hidden);
    }

    #[test]
    fn flag_accounting() {
        let mut board = Board::from_mines(9, 9, &[(8, 8)]).unwrap();

        for col in 0..5 {
            assert!(board.toggle_flag(0, col));
        }
        assert!(board.toggle_flag(0, 0));
        assert!(board.toggle_flag(0, 1));
        assert_eq!(board.flag_count(), 3);
        assert_eq!(board.mines_remaining(), -2);

        assert!(board.reveal(7, 7));
        assert_eq!(board.game_state(), GameState::Playing);
        assert!(!board.toggle_flag(7, 7));
        assert_eq!(board.flag_count(), 3);
    }

    #[test]
    fn flagged_cells_cannot_be_revealed() {
        let mut board = Board::from_mines(2, 2, &[(0, 0)]).unwrap();
        board.toggle_flag(0, 0);

        assert!(!board.reveal(0, 0));
        assert_eq!(board.game_state(), GameState::Playing);
        assert!(!board.is_timer_running());
    }

    #[test]
    fn out_of_bounds_moves_are_ignored() {
        let mut board = Board::from_mines(2, 2, &[(0, 0)]).unwrap();

        assert!(!board.reveal(2, 0));
        assert!(!board.reveal(0, 9));
        assert!(!board.toggle_flag(5, 5));
        assert!(board.cell(2, 2).is_none());
        assert_eq!(board.flag_count(), 0);
    }

    #[test]
    fn clock_runs_from_first_reveal_until_the_game_ends() {
        let mut board = Board::from_mines(1, 4, &[(0, 0)]).unwrap();

        board.tick();
        board.toggle_flag(0, 3);
        board.tick();
        assert_eq!(board.elapsed_seconds(), 0);

        board.reveal(0, 1);
        board.tick();
        board.tick();
        assert_eq!(board.elapsed_seconds(), 2);

        board.toggle_flag(0, 3);
        board.reveal(0, 3);
        assert_eq!(board.game_state(), GameState::Won);

        board.tick();
        assert_eq!(board.elapsed_seconds(), 2);
    }

    #[test]
    fn renders_cell_symbols() {
        let mut board = Board::from_mines(2, 3, &[(0, 0)]).unwrap();
        board.toggle_flag(1, 0);
        board.reveal(0, 2);

        let rendered = board.to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "     0  1  2");
        assert_eq!(lines[1], "  0  #  1  .");
        assert_eq!(lines[2], "  1  F  1  .");
    }
}
