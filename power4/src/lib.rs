//! # Power4
//!
//! A Connect-Four engine with a "gravity inversion" twist: every few moves
//! the edge tokens fall toward switches between the bottom and the top of the
//! board.
//!
//! ## Core Modules
//!
//! - [`game`]: Board, move rules, win/draw detection, snapshots, game registry
//! - [`auth`]: User registration, login, and session tokens
//! - [`db`]: PostgreSQL pool and the user repository
//!
//! ## Example
//!
//! ```
//! use power4::{GameConfig, GameState, MoveResult, Player};
//!
//! let mut game = GameState::with_config(GameConfig::classic()).unwrap();
//! for column in [0, 1, 0, 1, 0, 1] {
//!     game.play(column).unwrap();
//! }
//! let outcome = game.play(0).unwrap();
//! assert_eq!(outcome.result, MoveResult::Won(Player::PlayerOne));
//! ```

/// User accounts and sessions.
pub mod auth;

/// Database access.
pub mod db;

/// Core game logic and state machine.
pub mod game;
pub use game::{
    Board, Cell, GameConfig, GameRegistry, GameSnapshot, GameState, Gravity, MoveError,
    MoveOutcome, MoveResult, Phase, Player, SharedGame,
};
