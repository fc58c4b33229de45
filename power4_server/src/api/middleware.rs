//! Session middleware for protected endpoints.
//!
//! A session token is read from the `Authorization: Bearer <token>` header or
//! from the `session_token` cookie, resolved against the session store, and the
//! resulting [`CurrentUser`] is injected into request extensions for downstream
//! handlers.
//!
//! Two flavours exist because browsers and API clients want different
//! failures: HTML routes redirect to `/login`, JSON routes answer `401`.
//!
//! # Extracting the user
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use power4_server::api::middleware::CurrentUser;
//!
//! async fn protected_handler(Extension(user): Extension<CurrentUser>) -> String {
//!     format!("Hello {}", user.display_name())
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// Who is making the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurrentUser {
    /// Holder of a valid session
    User(String),
    /// No session, allowed because login is not required
    Guest,
}

impl CurrentUser {
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::User(name) => Some(name),
            Self::Guest => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.username().unwrap_or("guest")
    }
}

/// Session token from the bearer header, falling back to the cookie
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// `Set-Cookie` value opening a session
pub fn session_cookie(token: &str, max_age_secs: i64) -> HeaderValue {
    let cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    // Tokens are hex, so the value is always a valid header.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_session_cookie())
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    if let Some(token) = session_token(headers)
        && let Some(username) = state.auth_manager.resolve_session(token).await
    {
        return Some(CurrentUser::User(username));
    }

    (!state.require_login).then_some(CurrentUser::Guest)
}

/// Session middleware for HTML pages
///
/// - **Valid session**: injects `CurrentUser::User` and calls the next handler
/// - **No session, login required**: `303 See Other` to `/login`
/// - **No session, login optional**: injects `CurrentUser::Guest`
pub async fn page_session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, request.headers()).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Session middleware for JSON endpoints
///
/// Same as [`page_session_middleware`] but answers `401 Unauthorized`
/// instead of redirecting.
pub async fn api_session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match resolve_user(&state, request.headers()).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session_token=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(session_token(&headers), Some("header"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(session_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("deadbeef", 86_400);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session_token=deadbeef;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));

        assert!(clear_session_cookie().to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_current_user_names() {
        assert_eq!(CurrentUser::User("bob".into()).display_name(), "bob");
        assert_eq!(CurrentUser::Guest.display_name(), "guest");
        assert_eq!(CurrentUser::Guest.username(), None);
    }
}
