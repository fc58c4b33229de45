//! Page handlers for browsers.
//!
//! Form posts follow the post/redirect/get pattern: `/play` and `/reset`
//! always answer `303 See Other` back to `/`. A rejected move travels in the
//! redirect as `?notice=<code>` and is shown on the next render; the game
//! itself is left untouched.

use axum::{
    Form,
    extract::{Extension, Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use power4::{
    MoveError,
    auth::{AuthError, LoginRequest, RegisterRequest, Session},
};
use serde::Deserialize;

use super::{
    AppState,
    auth::{auth_status, authenticate, register_user},
    games::record_play,
    html,
    middleware::{CurrentUser, clear_session_cookie, session_cookie, session_token},
};
use crate::logging;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayForm {
    /// Kept as text so a malformed value becomes an invalid-column notice
    /// instead of a form rejection. A missing field reads as empty.
    #[serde(default)]
    pub col: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// Board of the default game
pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let snapshot = state.registry.default_game().await.snapshot().await;
    let notice = query
        .notice
        .as_deref()
        .and_then(MoveError::from_code)
        .map(|err| err.to_string());

    Html(html::board_page(&snapshot, &user, notice.as_deref()))
}

/// Drop a token in the default game, then go back to the board
pub async fn play(State(state): State<AppState>, Form(form): Form<PlayForm>) -> Redirect {
    let game = state.registry.default_game().await;

    let result = match form.col.trim().parse::<i64>() {
        Ok(column) => game.play(column).await,
        Err(_) => Err(MoveError::InvalidColumn),
    };
    record_play(game.id(), &result);

    match result {
        Ok(_) => Redirect::to("/"),
        Err(err) => Redirect::to(&format!("/?notice={}", err.code())),
    }
}

/// Start the default game over
pub async fn reset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Redirect {
    let game = state.registry.default_game().await;
    game.reset().await;
    logging::log_game_event(
        game.id(),
        "reset",
        &format!("Reset by {}", user.display_name()),
    );
    Redirect::to("/")
}

pub async fn login_page() -> Html<String> {
    Html(html::login_page(None))
}

pub async fn register_page() -> Html<String> {
    Html(html::register_page(None))
}

fn signed_in(state: &AppState, session: &Session) -> Response {
    let max_age = state.auth_manager.sessions().ttl().num_seconds();
    (
        [(SET_COOKIE, session_cookie(&session.token, max_age))],
        Redirect::to("/"),
    )
        .into_response()
}

fn form_error(err: &AuthError, render: fn(Option<&str>) -> String) -> Response {
    let (status, _) = auth_status(err);
    (status, Html(render(Some(&err.client_message())))).into_response()
}

/// Check credentials; on success set the session cookie and go to the board
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let request = LoginRequest {
        username: form.username.trim().to_string(),
        password: form.password,
    };

    match authenticate(&state, request).await {
        Ok((_, session)) => signed_in(&state, &session),
        Err(err) => form_error(&err, html::login_page),
    }
}

/// Create an account; on success log in right away
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let request = RegisterRequest {
        username: form.username.trim().to_string(),
        password: form.password,
    };

    match register_user(&state, request).await {
        Ok((user, session)) => {
            tracing::info!(username = %user.username, "User registered");
            signed_in(&state, &session)
        }
        Err(err) => {
            if !err.is_client_error() {
                tracing::error!("Registration failed: {}", err);
            }
            form_error(&err, html::register_page)
        }
    }
}

/// Close the cookie session and go to the login page
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.auth_manager.logout(token).await;
        state.refresh_gauges().await;
    }

    (
        [(SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
