//! Game state machine: move legality, win/draw detection, turn alternation
//! and periodic gravity inversion.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, Gravity, Player};
use super::snapshot::GameSnapshot;

/// Canonical number of rows.
pub const DEFAULT_ROWS: usize = 6;
/// Canonical number of columns.
pub const DEFAULT_COLS: usize = 7;
/// Largest accepted row or column count.
pub const MAX_DIMENSION: usize = 64;
/// Tokens in a row needed to win.
pub const DEFAULT_CONNECT: usize = 4;
/// Gravity inverts every this many accepted moves.
pub const DEFAULT_GRAVITY_FLIP_PERIOD: u32 = 5;

/// Reasons a move is rejected. The game state is never modified when one of
/// these is returned.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum MoveError {
    #[error("the game is over, start a new one")]
    GameFinished,
    #[error("invalid column")]
    InvalidColumn,
    #[error("this column is full, pick another one")]
    ColumnFull,
}

impl MoveError {
    /// Short machine-readable code used in redirects and JSON bodies
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::GameFinished => "game_finished",
            Self::InvalidColumn => "invalid_column",
            Self::ColumnFull => "column_full",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "game_finished" => Some(Self::GameFinished),
            "invalid_column" => Some(Self::InvalidColumn),
            "column_full" => Some(Self::ColumnFull),
            _ => None,
        }
    }
}

/// Invalid engine configuration
#[derive(Debug, Eq, Error, PartialEq)]
pub enum GameConfigError {
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    EmptyBoard { rows: usize, cols: usize },
    #[error("board of {rows}x{cols} exceeds the {max}x{max} limit")]
    BoardTooLarge { rows: usize, cols: usize, max: usize },
    #[error("connect length {connect} must be between 2 and {max}")]
    InvalidConnect { connect: usize, max: usize },
    #[error("gravity flip period must be at least 1")]
    InvalidFlipPeriod,
}

/// Engine configuration. The classic game and the inverted-gravity variant
/// differ only in `gravity_flip_period`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub connect: usize,
    /// `None` disables gravity inversion.
    pub gravity_flip_period: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            connect: DEFAULT_CONNECT,
            gravity_flip_period: Some(DEFAULT_GRAVITY_FLIP_PERIOD),
        }
    }
}

impl GameConfig {
    /// Classic rules: canonical board, gravity never flips
    #[must_use]
    pub fn classic() -> Self {
        Self {
            gravity_flip_period: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GameConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameConfigError::EmptyBoard {
                rows: self.rows,
                cols: self.cols,
            });
        }

        if self.rows > MAX_DIMENSION || self.cols > MAX_DIMENSION {
            return Err(GameConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: MAX_DIMENSION,
            });
        }

        let max = self.rows.max(self.cols);
        if self.connect < 2 || self.connect > max {
            return Err(GameConfigError::InvalidConnect {
                connect: self.connect,
                max,
            });
        }

        if self.gravity_flip_period == Some(0) {
            return Err(GameConfigError::InvalidFlipPeriod);
        }

        Ok(())
    }

    /// Number of cells; saturates for dimensions `validate` rejects
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }
}

/// What an accepted move led to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MoveResult {
    /// Turn passed to the other player.
    Continued,
    /// Turn passed and gravity now pulls toward the given edge.
    GravityFlipped(Gravity),
    /// The mover completed a line.
    Won(Player),
    /// The board filled up without a line.
    Drawn,
}

impl MoveResult {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won(_) | Self::Drawn)
    }
}

/// An accepted move.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub player: Player,
    pub row: usize,
    pub column: usize,
    pub result: MoveResult,
}

/// Coarse state of a game.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    InProgress { to_move: Player, gravity: Gravity },
    Won(Player),
    Drawn,
}

/// Full state of one game.
#[derive(Clone, Debug)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    current_player: Player,
    move_count: usize,
    gravity: Gravity,
    finished: bool,
    winner: Option<Player>,
    /// Human-readable status. Nothing depends on it.
    message: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_valid_config(GameConfig::default())
    }
}

impl GameState {
    /// Canonical 6x7 game with gravity inversion every 5 moves
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GameConfig) -> Result<Self, GameConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GameConfig) -> Self {
        Self {
            board: Board::new(config.rows, config.cols),
            config,
            current_player: Player::PlayerOne,
            move_count: 0,
            gravity: Gravity::Down,
            finished: false,
            winner: None,
            message: String::new(),
        }
    }

    /// Drop a token for the current player into `column`.
    ///
    /// Checks, in order: the game is not over, the column exists, the column
    /// has room. After placing, a line ends the game for the mover; otherwise
    /// a full board is a draw; otherwise gravity may flip and the turn passes.
    pub fn play(&mut self, column: i64) -> Result<MoveOutcome, MoveError> {
        if self.finished {
            return Err(MoveError::GameFinished);
        }

        let column = usize::try_from(column)
            .ok()
            .filter(|&col| col < self.config.cols)
            .ok_or(MoveError::InvalidColumn)?;

        let player = self.current_player;
        let row = self
            .board
            .drop_token(column, player, self.gravity)
            .ok_or(MoveError::ColumnFull)?;
        self.move_count += 1;

        let result = self.settle(row, column, player);
        debug!(
            "{player} played column {column} (row {row}), move {}: {result:?}",
            self.move_count
        );

        Ok(MoveOutcome {
            player,
            row,
            column,
            result,
        })
    }

    /// Win, draw, then gravity; a terminal move never flips gravity or the turn.
    fn settle(&mut self, row: usize, column: usize, player: Player) -> MoveResult {
        if self.board.completes_line(row, column, self.config.connect) {
            self.finished = true;
            self.winner = Some(player);
            self.message = format!("{player} wins!");
            return MoveResult::Won(player);
        }

        if self.move_count == self.config.capacity() {
            self.finished = true;
            self.winner = None;
            self.message = "Draw! The board is full.".to_string();
            return MoveResult::Drawn;
        }

        self.current_player = player.other();

        if self.flip_due() {
            self.gravity = self.gravity.flipped();
            self.message = format!("Gravity inverted! Tokens now fall {}.", self.gravity);
            MoveResult::GravityFlipped(self.gravity)
        } else {
            self.message.clear();
            MoveResult::Continued
        }
    }

    fn flip_due(&self) -> bool {
        self.config
            .gravity_flip_period
            .is_some_and(|period| self.move_count % period as usize == 0)
    }

    /// Restore the fresh state, keeping the configuration.
    pub fn reset(&mut self) {
        self.board.clear();
        self.current_player = Player::PlayerOne;
        self.move_count = 0;
        self.gravity = Gravity::Down;
        self.finished = false;
        self.winner = None;
        self.message.clear();
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn current_player(&self) -> Player {
        self.current_player
    }

    #[must_use]
    pub const fn move_count(&self) -> usize {
        self.move_count
    }

    #[must_use]
    pub const fn gravity(&self) -> Gravity {
        self.gravity
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub const fn winner(&self) -> Option<Player> {
        self.winner
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        match (self.finished, self.winner) {
            (true, Some(player)) => Phase::Won(player),
            (true, None) => Phase::Drawn,
            (false, _) => Phase::InProgress {
                to_move: self.current_player,
                gravity: self.gravity,
            },
        }
    }

    /// Accepted moves left before the next inversion, if the variant is on
    #[must_use]
    pub fn moves_until_flip(&self) -> Option<u32> {
        self.config.gravity_flip_period.map(|period| {
            let period = period as usize;
            (period - self.move_count % period) as u32
        })
    }

    /// Read-only copy of everything a renderer needs
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }
}
