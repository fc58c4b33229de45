//! Game management API handlers.
//!
//! All endpoints require a session (or `REQUIRE_LOGIN=false`).
//!
//! # Examples
//!
//! Create a game and drop a token:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games -H "Authorization: Bearer TOKEN"
//! curl -X POST http://localhost:3000/api/v1/games/2/play \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"column": 3}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use power4::{
    GameSnapshot, MoveError, MoveOutcome, MoveResult,
    game::{CreateGameError, GameId, GameSummary, RemoveGameError, SharedGame},
};
use serde::{Deserialize, Serialize};

use super::{AppState, ApiResult, ErrorResponse, api_error, middleware::CurrentUser, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub column: i64,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub outcome: MoveOutcome,
    pub game: GameSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub id: GameId,
}

/// HTTP status for a rejected move
pub(crate) fn move_status(err: MoveError) -> StatusCode {
    match err {
        MoveError::InvalidColumn => StatusCode::BAD_REQUEST,
        MoveError::ColumnFull | MoveError::GameFinished => StatusCode::CONFLICT,
    }
}

/// Metrics and game-event logging for one play attempt
pub(crate) fn record_play(game_id: GameId, result: &Result<MoveOutcome, MoveError>) {
    metrics::record_move(result);

    let Ok(outcome) = result else {
        return;
    };
    match outcome.result {
        MoveResult::Won(player) => {
            logging::log_game_event(game_id, "won", &format!("{player} wins"));
        }
        MoveResult::Drawn => logging::log_game_event(game_id, "drawn", "Board full"),
        MoveResult::GravityFlipped(gravity) => {
            logging::log_game_event(game_id, "gravity_flipped", &format!("Tokens now fall {gravity}"));
        }
        MoveResult::Continued => {}
    }
}

fn game_not_found(game_id: GameId) -> (StatusCode, Json<ErrorResponse>) {
    api_error(
        StatusCode::NOT_FOUND,
        "game_not_found",
        format!("Game {game_id} not found"),
    )
}

async fn find_game(state: &AppState, game_id: GameId) -> ApiResult<SharedGame> {
    state
        .registry
        .get(game_id)
        .await
        .ok_or_else(|| game_not_found(game_id))
}

/// List all games.
///
/// ```json
/// [{ "id": 1, "move_count": 3, "current_player": 2, "gravity": "down", "finished": false, "winner": null }]
/// ```
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<GameSummary>> {
    Json(state.registry.list().await)
}

/// Create a game with the server's rules. Returns `201 Created` with `{"id": n}`.
///
/// # Errors
///
/// - `429 Too Many Requests`: `MAX_GAMES` games already exist (`game_limit_reached`)
pub async fn create_game(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<(StatusCode, Json<CreateGameResponse>)> {
    let id = state.registry.create_game().await.map_err(|err| match err {
        CreateGameError::LimitReached(_) => api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "game_limit_reached",
            err.to_string(),
        ),
    })?;
    state.refresh_gauges().await;
    logging::log_game_event(id, "created", &format!("Created by {}", user.display_name()));

    Ok((StatusCode::CREATED, Json(CreateGameResponse { id })))
}

/// Full state of one game.
///
/// # Errors
///
/// - `404 Not Found`: No such game
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = find_game(&state, game_id).await?;
    Ok(Json(game.snapshot().await))
}

/// Drop a token for the player whose turn it is.
///
/// # Request Body
///
/// ```json
/// { "column": 3 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Column outside the board (`invalid_column`)
/// - `404 Not Found`: No such game
/// - `409 Conflict`: Column full (`column_full`) or game over (`game_finished`)
pub async fn play_move(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    request_id: RequestId,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PlayRequest>,
) -> ApiResult<Json<PlayResponse>> {
    let game = find_game(&state, game_id).await?;
    let (result, snapshot) = game.play_and_snapshot(payload.column).await;
    record_play(game_id, &result);

    match result {
        Ok(outcome) => Ok(Json(PlayResponse {
            outcome,
            game: snapshot,
        })),
        Err(err) => {
            tracing::debug!(
                request_id = %request_id.as_str(),
                game_id = game_id,
                username = user.display_name(),
                column = payload.column,
                "Move rejected: {}",
                err
            );
            Err(api_error(move_status(err), err.code(), err.to_string()))
        }
    }
}

/// Start a game over with the same rules.
pub async fn reset_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = find_game(&state, game_id).await?;
    let snapshot = game.reset().await;
    logging::log_game_event(game_id, "reset", "Game reset");
    Ok(Json(snapshot))
}

/// Remove a game.
///
/// # Errors
///
/// - `404 Not Found`: No such game
/// - `409 Conflict`: The default game cannot be removed
pub async fn delete_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<StatusCode> {
    match state.registry.remove(game_id).await {
        Ok(()) => {
            state.refresh_gauges().await;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(RemoveGameError::NotFound(id)) => Err(game_not_found(id)),
        Err(err @ RemoveGameError::DefaultGame) => Err(api_error(
            StatusCode::CONFLICT,
            "default_game",
            err.to_string(),
        )),
    }
}
