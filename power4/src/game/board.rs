//! Board representation, token placement and line detection.
//!
//! Row 0 is the top row and row `rows - 1` the bottom row. Tokens settle
//! toward the edge selected by the current [`Gravity`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis directions checked for a line, as `(row delta, column delta)`:
/// horizontal, vertical, and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// One of the two players.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    PlayerOne,
    PlayerTwo,
}

impl Player {
    /// Get the other player
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::PlayerOne => Self::PlayerTwo,
            Self::PlayerTwo => Self::PlayerOne,
        }
    }

    /// Player number as shown to users (1 or 2)
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::PlayerOne => 1,
            Self::PlayerTwo => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

impl From<Player> for u8 {
    fn from(value: Player) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PlayerOne),
            2 => Ok(Self::PlayerTwo),
            other => Err(format!("invalid player number {other}")),
        }
    }
}

/// Contents of a single board cell.
///
/// Serialized as `0` (empty), `1` or `2` (player tokens).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    #[default]
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The player owning this cell, if any
    #[must_use]
    pub const fn owner(self) -> Option<Player> {
        match self {
            Self::Empty => None,
            Self::PlayerOne => Some(Player::PlayerOne),
            Self::PlayerTwo => Some(Player::PlayerTwo),
        }
    }
}

impl From<Player> for Cell {
    fn from(value: Player) -> Self {
        match value {
            Player::PlayerOne => Self::PlayerOne,
            Player::PlayerTwo => Self::PlayerTwo,
        }
    }
}

impl From<Cell> for u8 {
    fn from(value: Cell) -> Self {
        value.owner().map_or(0, Player::number)
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            n => Player::try_from(n)
                .map(Self::from)
                .map_err(|_| format!("invalid cell value {n}")),
        }
    }
}

/// Edge of the board toward which new tokens settle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    /// Tokens fall to the bottom row.
    #[default]
    Down,
    /// Tokens rise to the top row.
    Up,
}

impl Gravity {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
        }
    }
}

/// A fixed-size grid of cells, stored row-major.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board with the given dimensions
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Get the cell at `(row, col)`, or `None` outside the board
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Signed lookup used when walking away from a cell.
    fn get_signed(&self, row: isize, col: isize) -> Option<Cell> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.get(row, col)
    }

    /// First empty row in `col`, scanning from the edge gravity pulls toward.
    ///
    /// Returns `None` when the column has no empty cell or is out of range.
    #[must_use]
    pub fn landing_row(&self, col: usize, gravity: Gravity) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        let is_free = |row: &usize| self.cells[row * self.cols + col].is_empty();
        match gravity {
            Gravity::Down => (0..self.rows).rev().find(is_free),
            Gravity::Up => (0..self.rows).find(is_free),
        }
    }

    #[must_use]
    pub fn is_column_full(&self, col: usize, gravity: Gravity) -> bool {
        self.landing_row(col, gravity).is_none()
    }

    /// Drop a token into `col`, returning the row it settled on.
    ///
    /// Returns `None` and leaves the board untouched when the column is full
    /// or out of range.
    pub fn drop_token(&mut self, col: usize, player: Player, gravity: Gravity) -> Option<usize> {
        let row = self.landing_row(col, gravity)?;
        self.cells[row * self.cols + col] = player.into();
        Some(row)
    }

    /// Number of occupied cells
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Rows of the grid, top to bottom
    pub fn grid(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols.max(1))
    }

    /// Count same-owner tokens walking from `(row, col)` by `(dr, dc)`,
    /// excluding the starting cell.
    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while self.get_signed(r, c) == Some(cell) {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    /// Whether the token at `(row, col)` is part of a line of at least
    /// `connect` same-owner tokens.
    ///
    /// Only the four axes through the cell are walked, so the cost is bounded
    /// by the board dimensions rather than its area.
    #[must_use]
    pub fn completes_line(&self, row: usize, col: usize, connect: usize) -> bool {
        let Some(cell) = self.get(row, col) else {
            return false;
        };
        if cell.is_empty() {
            return false;
        }

        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run_length(row, col, dr, dc, cell) + self.run_length(row, col, -dr, -dc, cell)
                >= connect
        })
    }

    /// Whether `player` owns any line of `connect` tokens anywhere on the board.
    ///
    /// Full scan over every window; used to cross-check [`Board::completes_line`].
    #[must_use]
    pub fn has_line(&self, player: Player, connect: usize) -> bool {
        if connect == 0 {
            return true;
        }
        let target = Cell::from(player);
        let span = connect as isize - 1;

        for row in 0..self.rows {
            for col in 0..self.cols {
                for &(dr, dc) in &DIRECTIONS {
                    let (r, c) = (row as isize, col as isize);
                    if self.get_signed(r + dr * span, c + dc * span).is_none() {
                        continue;
                    }
                    if (0..connect as isize)
                        .all(|i| self.get_signed(r + dr * i, c + dc * i) == Some(target))
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(6, 7)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid() {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => '.',
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(6, 7);
        assert_eq!(board.occupied(), 0);
        assert!(!board.is_full());
        for row in 0..6 {
            for col in 0..7 {
                assert_eq!(board.get(row, col), Some(Cell::Empty));
            }
        }
        assert_eq!(board.get(6, 0), None);
        assert_eq!(board.get(0, 7), None);
    }

    #[test]
    fn test_drop_token_down_stacks_from_bottom() {
        let mut board = Board::default();
        assert_eq!(board.drop_token(3, Player::PlayerOne, Gravity::Down), Some(5));
        assert_eq!(board.drop_token(3, Player::PlayerTwo, Gravity::Down), Some(4));
        assert_eq!(board.get(5, 3), Some(Cell::PlayerOne));
        assert_eq!(board.get(4, 3), Some(Cell::PlayerTwo));
    }

    #[test]
    fn test_drop_token_up_stacks_from_top() {
        let mut board = Board::default();
        assert_eq!(board.drop_token(0, Player::PlayerOne, Gravity::Up), Some(0));
        assert_eq!(board.drop_token(0, Player::PlayerTwo, Gravity::Up), Some(1));
    }

    #[test]
    fn test_mixed_gravity_fills_gap_from_active_edge() {
        let mut board = Board::new(4, 1);
        board.drop_token(0, Player::PlayerOne, Gravity::Down);
        board.drop_token(0, Player::PlayerOne, Gravity::Up);
        // Rows 1 and 2 are free; Down takes the lower one, Up the upper one.
        assert_eq!(board.landing_row(0, Gravity::Down), Some(2));
        assert_eq!(board.landing_row(0, Gravity::Up), Some(1));
    }

    #[test]
    fn test_full_column_rejects_token() {
        let mut board = Board::new(2, 2);
        board.drop_token(1, Player::PlayerOne, Gravity::Down);
        board.drop_token(1, Player::PlayerTwo, Gravity::Down);
        assert!(board.is_column_full(1, Gravity::Down));
        assert!(board.is_column_full(1, Gravity::Up));
        let before = board.clone();
        assert_eq!(board.drop_token(1, Player::PlayerOne, Gravity::Up), None);
        assert_eq!(board, before);
    }

    #[test]
    fn test_out_of_range_column() {
        let mut board = Board::default();
        assert_eq!(board.landing_row(7, Gravity::Down), None);
        assert_eq!(board.drop_token(7, Player::PlayerOne, Gravity::Down), None);
    }

    #[test]
    fn test_horizontal_line() {
        let mut board = Board::default();
        for col in 1..4 {
            board.drop_token(col, Player::PlayerOne, Gravity::Down);
        }
        assert!(!board.completes_line(5, 3, 4));
        board.drop_token(4, Player::PlayerOne, Gravity::Down);
        // Middle of the line counts both directions.
        assert!(board.completes_line(5, 2, 4));
        assert!(board.has_line(Player::PlayerOne, 4));
        assert!(!board.has_line(Player::PlayerTwo, 4));
    }

    #[test]
    fn test_vertical_line() {
        let mut board = Board::default();
        for _ in 0..4 {
            board.drop_token(6, Player::PlayerTwo, Gravity::Down);
        }
        assert!(board.completes_line(2, 6, 4));
    }

    #[test]
    fn test_diagonal_lines() {
        // Rising diagonal: (5,0) (4,1) (3,2) (2,3)
        let mut board = Board::default();
        for (col, fillers) in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            for _ in 0..fillers {
                board.drop_token(col, Player::PlayerTwo, Gravity::Down);
            }
            board.drop_token(col, Player::PlayerOne, Gravity::Down);
        }
        assert!(board.completes_line(3, 2, 4));
        assert!(board.has_line(Player::PlayerOne, 4));

        // Falling diagonal: (2,3) (3,4) (4,5) (5,6)
        let mut board = Board::default();
        for (col, fillers) in [(3, 3), (4, 2), (5, 1), (6, 0)] {
            for _ in 0..fillers {
                board.drop_token(col, Player::PlayerOne, Gravity::Down);
            }
            board.drop_token(col, Player::PlayerTwo, Gravity::Down);
        }
        assert!(board.completes_line(5, 6, 4));
        assert!(board.has_line(Player::PlayerTwo, 4));
    }

    #[test]
    fn test_opponent_token_breaks_line() {
        let mut board = Board::default();
        for col in [0, 1, 3] {
            board.drop_token(col, Player::PlayerOne, Gravity::Down);
        }
        board.drop_token(2, Player::PlayerTwo, Gravity::Down);
        assert!(!board.completes_line(5, 3, 4));
        assert!(!board.has_line(Player::PlayerOne, 4));
    }

    #[test]
    fn test_empty_cell_never_completes_line() {
        let board = Board::default();
        assert!(!board.completes_line(0, 0, 1));
        assert!(!board.completes_line(10, 10, 4));
    }

    #[test]
    fn test_cell_serialization_as_numbers() {
        let json = serde_json::to_string(&[Cell::Empty, Cell::PlayerOne, Cell::PlayerTwo]).unwrap();
        assert_eq!(json, "[0,1,2]");
        let player: Player = serde_json::from_str("2").unwrap();
        assert_eq!(player, Player::PlayerTwo);
        assert!(serde_json::from_str::<Cell>("3").is_err());
    }

    #[test]
    fn test_display_renders_rows_top_down() {
        let mut board = Board::new(2, 3);
        board.drop_token(0, Player::PlayerOne, Gravity::Down);
        board.drop_token(2, Player::PlayerTwo, Gravity::Up);
        assert_eq!(board.to_string(), "..O\nX..\n");
    }
}
