//! Prometheus metrics for monitoring game server health and activity.
//!
//! Metrics are recorded through the `metrics` facade and exposed in
//! Prometheus text format when an exporter address is configured. Without
//! an installed exporter every call here is a no-op.
//!
//! # Metrics
//!
//! - `power4_moves_total{outcome}`: accepted moves by result
//! - `power4_rejected_moves_total{reason}`: rejected moves by error code
//! - `power4_games_finished_total{result}`: wins and draws
//! - `power4_login_attempts_total{result}`: login successes and failures
//! - `power4_active_games`: games in the registry
//! - `power4_active_sessions`: stored sessions
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use power4_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::login_attempts_total(true);
//! metrics::active_games(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use power4::{MoveError, MoveOutcome, MoveResult};
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Record the result of a play attempt.
pub fn record_move(result: &Result<MoveOutcome, MoveError>) {
    match result {
        Ok(outcome) => {
            let label = match outcome.result {
                MoveResult::Continued => "continued",
                MoveResult::GravityFlipped(_) => "gravity_flipped",
                MoveResult::Won(_) => "won",
                MoveResult::Drawn => "drawn",
            };
            metrics::counter!("power4_moves_total", "outcome" => label).increment(1);

            match outcome.result {
                MoveResult::Won(_) => games_finished_total("won"),
                MoveResult::Drawn => games_finished_total("drawn"),
                _ => {}
            }
        }
        Err(err) => {
            metrics::counter!("power4_rejected_moves_total", "reason" => err.code()).increment(1);
        }
    }
}

/// Increment finished games counter.
pub fn games_finished_total(result: &'static str) {
    metrics::counter!("power4_games_finished_total", "result" => result).increment(1);
}

/// Set current game count.
pub fn active_games(count: usize) {
    metrics::gauge!("power4_active_games").set(count as f64);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("power4_login_attempts_total", "result" => result).increment(1);
}

/// Set current session count.
pub fn active_sessions(count: usize) {
    metrics::gauge!("power4_active_sessions").set(count as f64);
}
