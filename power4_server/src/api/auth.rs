//! Authentication API handlers.
//!
//! JSON counterparts of the login and register forms. A successful call
//! returns the session token in the body and also sets the session cookie, so
//! both API clients (`Authorization: Bearer`) and browsers can use it.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "password": "Pass123!"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "password": "Pass123!"}'
//! ```

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use power4::auth::{AuthError, AuthResult, LoginRequest, RegisterRequest, Session, User};
use serde::Serialize;

use super::{
    AppState, ApiResult, api_error,
    middleware::{clear_session_cookie, session_cookie, session_token},
};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// HTTP status and code for an authentication failure
pub(crate) fn auth_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "user_not_found"),
        AuthError::InvalidPassword => (StatusCode::UNAUTHORIZED, "invalid_password"),
        AuthError::UsernameTaken => (StatusCode::CONFLICT, "username_taken"),
        AuthError::InvalidUsername(_) => (StatusCode::BAD_REQUEST, "invalid_username"),
        AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "weak_password"),
        AuthError::Database(_) | AuthError::HashingFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

fn auth_error(err: AuthError) -> (StatusCode, Json<super::ErrorResponse>) {
    let (status, code) = auth_status(&err);
    if status.is_server_error() {
        tracing::error!("Authentication backend error: {}", err);
    }
    api_error(status, code, err.client_message())
}

/// Log in with metrics and security logging; shared with the login form.
pub(crate) async fn authenticate(
    state: &AppState,
    request: LoginRequest,
) -> AuthResult<(User, Session)> {
    let username = request.username.clone();
    let result = state.auth_manager.login(request).await;

    metrics::login_attempts_total(result.is_ok());
    match &result {
        Ok(_) => {
            tracing::info!(username = %username, "User logged in");
            state.refresh_gauges().await;
        }
        Err(err) if err.is_client_error() => {
            logging::log_security_event("failed_login", Some(&username), &err.to_string());
        }
        Err(err) => tracing::error!("Login failed for {}: {}", username, err),
    }

    result
}

/// Register and open a session; shared with the register form.
pub(crate) async fn register_user(
    state: &AppState,
    request: RegisterRequest,
) -> AuthResult<(User, Session)> {
    let result = state.auth_manager.register_and_login(request).await;
    if result.is_ok() {
        state.refresh_gauges().await;
    }
    result
}

fn session_response(state: &AppState, user: User, session: Session) -> Response {
    let max_age = state.auth_manager.sessions().ttl().num_seconds();
    let cookie = session_cookie(&session.token, max_age);

    (
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            token: session.token,
            user_id: user.id,
            username: user.username,
            expires_at: session.expires_at,
        }),
    )
        .into_response()
}

/// Register a new user account and automatically log them in.
///
/// # Request Body
///
/// ```json
/// { "username": "player123", "password": "SecurePass123!" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid username or password too short
/// - `409 Conflict`: Username already taken
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let (user, session) = register_user(&state, payload).await.map_err(auth_error)?;
    Ok(session_response(&state, user, session))
}

/// Authenticate a user and open a session.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let (user, session) = authenticate(&state, payload).await.map_err(auth_error)?;
    Ok(session_response(&state, user, session))
}

/// Close the session named by the bearer header or cookie.
///
/// Always answers `204 No Content` and clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.auth_manager.logout(token).await;
        state.refresh_gauges().await;
    }

    (StatusCode::NO_CONTENT, [(SET_COOKIE, clear_session_cookie())])
}
