//! Connect-Four engine with periodic gravity inversion.
//!
//! This module provides:
//! - Board representation and token placement under either gravity direction
//! - Local win detection around the last placed token
//! - The turn/gravity state machine behind `play` and `reset`
//! - Read-only snapshots for renderers
//! - A registry of games, each behind its own lock

pub mod board;
pub mod engine;
pub mod registry;
pub mod snapshot;

pub use board::{Board, Cell, Gravity, Player};
pub use engine::{
    DEFAULT_COLS, DEFAULT_CONNECT, DEFAULT_GRAVITY_FLIP_PERIOD, DEFAULT_ROWS, GameConfig,
    GameConfigError, GameState, MAX_DIMENSION, MoveError, MoveOutcome, MoveResult, Phase,
};
pub use registry::{
    CreateGameError, DEFAULT_GAME_ID, DEFAULT_MAX_GAMES, GameId, GameRegistry, GameSummary,
    RemoveGameError, SharedGame,
};
pub use snapshot::GameSnapshot;
