//! Registry of live games, each behind its own lock.

use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

use super::board::{Gravity, Player};
use super::engine::{GameConfig, GameConfigError, GameState, MoveError, MoveOutcome};
use super::snapshot::GameSnapshot;

/// Game identifier
pub type GameId = u64;

/// The game created with the registry, shared by every HTML user.
pub const DEFAULT_GAME_ID: GameId = 1;

/// Games a registry holds at most, the default game included.
pub const DEFAULT_MAX_GAMES: usize = 1000;

/// Handle to one game. Cloning is cheap; all clones share the same state.
///
/// Every operation takes the game's lock for its whole read-check-mutate
/// sequence, so two moves never interleave and a snapshot never observes a
/// half-applied move.
#[derive(Clone, Debug)]
pub struct SharedGame {
    id: GameId,
    state: Arc<Mutex<GameState>>,
}

impl SharedGame {
    #[must_use]
    pub fn new(id: GameId, state: GameState) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(state)),
        }
    }

    #[must_use]
    pub const fn id(&self) -> GameId {
        self.id
    }

    pub async fn play(&self, column: i64) -> Result<MoveOutcome, MoveError> {
        self.state.lock().await.play(column)
    }

    /// Play and capture the resulting state in the same critical section
    pub async fn play_and_snapshot(
        &self,
        column: i64,
    ) -> (Result<MoveOutcome, MoveError>, GameSnapshot) {
        let mut state = self.state.lock().await;
        let result = state.play(column);
        (result, state.snapshot())
    }

    pub async fn reset(&self) -> GameSnapshot {
        let mut state = self.state.lock().await;
        state.reset();
        state.snapshot()
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.state.lock().await.snapshot()
    }

    async fn summary(&self) -> GameSummary {
        let state = self.state.lock().await;
        GameSummary {
            id: self.id,
            move_count: state.move_count(),
            current_player: state.current_player(),
            gravity: state.gravity(),
            finished: state.is_finished(),
            winner: state.winner(),
        }
    }
}

/// Listing entry for a game
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GameSummary {
    pub id: GameId,
    pub move_count: usize,
    pub current_player: Player,
    pub gravity: Gravity,
    pub finished: bool,
    pub winner: Option<Player>,
}

/// Why a game could not be removed
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RemoveGameError {
    #[error("game {0} not found")]
    NotFound(GameId),
    #[error("the default game cannot be removed")]
    DefaultGame,
}

/// Why a game could not be created
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CreateGameError {
    #[error("game limit of {0} reached, remove a game first")]
    LimitReached(usize),
}

/// Registry mapping game ids to shared games
pub struct GameRegistry {
    default_config: GameConfig,
    max_games: usize,
    games: RwLock<HashMap<GameId, SharedGame>>,
    next_game_id: RwLock<GameId>,
}

impl GameRegistry {
    /// Create a registry holding a fresh default game
    ///
    /// # Errors
    ///
    /// Returns an error if `default_config` is invalid
    pub fn new(default_config: GameConfig) -> Result<Self, GameConfigError> {
        let default_game = SharedGame::new(
            DEFAULT_GAME_ID,
            GameState::with_config(default_config.clone())?,
        );

        Ok(Self {
            default_config,
            max_games: DEFAULT_MAX_GAMES,
            games: RwLock::new(HashMap::from([(DEFAULT_GAME_ID, default_game)])),
            next_game_id: RwLock::new(DEFAULT_GAME_ID + 1),
        })
    }

    /// Cap the number of games, the default game included (at least 1)
    #[must_use]
    pub fn with_max_games(mut self, max_games: usize) -> Self {
        self.max_games = max_games.max(1);
        self
    }

    #[must_use]
    pub const fn default_config(&self) -> &GameConfig {
        &self.default_config
    }

    #[must_use]
    pub const fn max_games(&self) -> usize {
        self.max_games
    }

    /// Create a new game with the registry's default configuration
    ///
    /// # Errors
    ///
    /// Returns [`CreateGameError::LimitReached`] when the registry is full
    pub async fn create_game(&self) -> Result<GameId, CreateGameError> {
        // Map lock first, then the id counter
        let mut games = self.games.write().await;
        if games.len() >= self.max_games {
            log::warn!("Game limit of {} reached", self.max_games);
            return Err(CreateGameError::LimitReached(self.max_games));
        }

        let game_id = {
            let mut next_id = self.next_game_id.write().await;
            let game_id = *next_id;
            *next_id += 1;
            game_id
        };

        // The default config was validated when the registry was built.
        let state = GameState::with_config(self.default_config.clone()).unwrap_or_default();
        games.insert(game_id, SharedGame::new(game_id, state));
        drop(games);

        log::info!("Created game {}", game_id);

        Ok(game_id)
    }

    pub async fn get(&self, game_id: GameId) -> Option<SharedGame> {
        let games = self.games.read().await;
        games.get(&game_id).cloned()
    }

    /// The game shared by all HTML users
    pub async fn default_game(&self) -> SharedGame {
        match self.get(DEFAULT_GAME_ID).await {
            Some(game) => game,
            None => {
                // Unreachable through the public API; recreate rather than panic.
                log::warn!("Default game missing from registry, recreating it");
                let state = GameState::with_config(self.default_config.clone()).unwrap_or_default();
                let game = SharedGame::new(DEFAULT_GAME_ID, state);
                let mut games = self.games.write().await;
                games.entry(DEFAULT_GAME_ID).or_insert(game).clone()
            }
        }
    }

    /// Summaries of all games, ordered by id
    pub async fn list(&self) -> Vec<GameSummary> {
        // Clone handles first so no game lock is taken while holding the map lock.
        let handles: Vec<SharedGame> = {
            let games = self.games.read().await;
            games.values().cloned().collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for game in handles {
            summaries.push(game.summary().await);
        }
        summaries.sort_by_key(|summary| summary.id);
        summaries
    }

    pub async fn remove(&self, game_id: GameId) -> Result<(), RemoveGameError> {
        if game_id == DEFAULT_GAME_ID {
            return Err(RemoveGameError::DefaultGame);
        }

        let mut games = self.games.write().await;
        games
            .remove(&game_id)
            .ok_or(RemoveGameError::NotFound(game_id))?;
        drop(games);

        log::info!("Removed game {}", game_id);

        Ok(())
    }

    pub async fn count(&self) -> usize {
        let games = self.games.read().await;
        games.len()
    }
}
