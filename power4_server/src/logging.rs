//! Structured logging configuration.
//!
//! Sets up `tracing` with an env-driven filter and provides helpers for the
//! events worth correlating: security events, game events and API requests.
//! Records emitted by the library through the `log` facade end up in the
//! same subscriber.

use power4::game::GameId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use power4_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use power4_server::logging::log_security_event;
///
/// log_security_event("failed_login", Some("alice"), "Wrong password");
/// ```
pub fn log_security_event(event_type: &str, username: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        username = username,
        "SECURITY: {}",
        message
    );
}

/// Log a notable game event (win, draw, gravity flip, reset)
pub fn log_game_event(game_id: GameId, event: &str, message: &str) {
    tracing::info!(game_id = game_id, event = event, "GAME: {}", message);
}

/// Log API request/response
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
/// * `request_id` - Correlation id of the request
pub fn log_api_request(
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
    request_id: &str,
) {
    if status_code >= 500 {
        tracing::error!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            request_id = request_id,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            request_id = request_id,
            "API request completed"
        );
    }
}
