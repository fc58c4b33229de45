//! HTTP API and HTML pages for the game server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTML forms and JSON
//! - **Tower**: Middleware for CORS, sessions and request ids
//! - **Game registry**: every game sits behind its own lock, so a move and the
//!   page rendered after it never observe a half-applied state
//!
//! # Modules
//!
//! - [`auth`]: JSON register/login/logout
//! - [`games`]: JSON game management and moves
//! - [`pages`]: server-rendered pages and form handlers
//! - [`middleware`]: session middleware for protected routes
//! - [`request_id`]: request correlation ids
//!
//! # Endpoints Overview
//!
//! ## Pages
//! - `GET /` - Board of the default game (session)
//! - `POST /play` - Drop a token, form field `col` (session)
//! - `POST /reset` - Start the default game over (session)
//! - `GET|POST /login`, `GET|POST /register`, `POST /logout`
//!
//! ## API v1
//! - `POST /api/v1/auth/register`, `POST /api/v1/auth/login`, `POST /api/v1/auth/logout`
//! - `GET|POST /api/v1/games` - List / create games (session)
//! - `GET|DELETE /api/v1/games/{id}` - Fetch / remove a game (session)
//! - `POST /api/v1/games/{id}/play` - Drop a token, body `{"column": n}` (session)
//! - `POST /api/v1/games/{id}/reset` - Start a game over (session)
//!
//! ## Other
//! - `GET /health` - Server health status
//! - `GET /assets/*` - Static files
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod games;
mod html;
pub mod middleware;
pub mod pages;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use power4::{auth::AuthManager, db::Database, game::GameRegistry};
use serde::Serialize;
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::metrics;

/// Application state shared across all handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub registry: Arc<GameRegistry>,
    /// Present when users live in PostgreSQL; checked by `/health`
    pub database: Option<Database>,
    /// Whether game routes need a logged-in user
    pub require_login: bool,
    /// Directory served under `/assets`
    pub assets_dir: PathBuf,
}

impl AppState {
    /// Push current game and session counts to the gauges
    pub async fn refresh_gauges(&self) {
        metrics::active_games(self.registry.count().await);
        metrics::active_sessions(self.auth_manager.sessions().len().await);
    }
}

/// JSON error body shared by all API handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code
    pub code: &'static str,
}

/// Result type of JSON handlers
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

pub(crate) fn api_error(
    status: StatusCode,
    code: &'static str,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code,
        }),
    )
}

/// Create the complete router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use power4_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    // Pages reachable without a session
    let public_pages = Router::new()
        .route("/login", get(pages::login_page).post(pages::login_submit))
        .route(
            "/register",
            get(pages::register_page).post(pages::register_submit),
        )
        .route("/logout", post(pages::logout));

    // Pages behind the session middleware
    let game_pages = Router::new()
        .route("/", get(pages::index))
        .route("/play", post(pages::play))
        .route("/reset", post(pages::reset))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::page_session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_pages)
        .merge(game_pages)
        .nest("/api/v1", v1_routes)
        .nest_service("/assets", ServeDir::new(&state.assets_dir))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(request_id::request_id_middleware)),
        )
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game).delete(games::delete_game),
        )
        .route("/games/{game_id}/play", post(games::play_move))
        .route("/games/{game_id}/reset", post(games::reset_game))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::api_session_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when healthy, or `503 Service Unavailable` when the
/// configured database does not answer. `users` is null when the count
/// query fails.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"0.1.0","database":"memory","games":1,"users":0,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (database, db_healthy) = match &state.database {
        Some(db) => {
            let healthy = db.health_check().await.is_ok();
            (json!(healthy), healthy)
        }
        None => (json!("memory"), true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "games": state.registry.count().await,
        "users": state.auth_manager.user_count().await.ok(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
