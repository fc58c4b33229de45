//! Power4 web server.
//!
//! Serves the default game as HTML pages, a JSON API over every game in the
//! registry, and the login/register flow in front of both.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
