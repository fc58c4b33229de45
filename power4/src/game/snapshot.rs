//! Read-only view of a game for renderers and JSON encoders.

use serde::{Deserialize, Serialize};

use super::board::{Cell, Gravity, Player};
use super::engine::GameState;

/// Consistent copy of a game's state, taken under the game's lock.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Rows top to bottom; cells are `0` (empty), `1` or `2`.
    pub board: Vec<Vec<Cell>>,
    pub current_player: Player,
    pub finished: bool,
    pub winner: Option<Player>,
    pub message: String,
    pub gravity: Gravity,
    pub move_count: usize,
    /// `None` when gravity inversion is disabled.
    pub moves_until_flip: Option<u32>,
}

impl From<&GameState> for GameSnapshot {
    fn from(game: &GameState) -> Self {
        let board = game.board();
        Self {
            rows: board.rows(),
            cols: board.cols(),
            board: board.grid().map(<[Cell]>::to_vec).collect(),
            current_player: game.current_player(),
            finished: game.is_finished(),
            winner: game.winner(),
            message: game.message().to_string(),
            gravity: game.gravity(),
            move_count: game.move_count(),
            moves_until_flip: game.moves_until_flip(),
        }
    }
}

impl GameSnapshot {
    /// Whether `col` can take another token under the current gravity
    #[must_use]
    pub fn is_column_open(&self, col: usize) -> bool {
        !self.finished && self.board.iter().any(|row| row.get(col).is_some_and(|c| c.is_empty()))
    }
}
