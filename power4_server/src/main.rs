//! Power4 web server.
//!
//! Hosts the default game as HTML pages and every game in the registry over
//! the JSON API, with users stored in PostgreSQL or in memory.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Error;
use chrono::Duration;
use log::{error, info, warn};
use pico_args::Arguments;
use power4::{
    auth::{AuthManager, SessionStore},
    db::{Database, InMemoryUserRepository, UserRepository},
    game::GameRegistry,
};
use power4_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run the Power4 web server

USAGE:
  power4_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL, users kept in memory if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 characters)
  GRAVITY_FLIP_PERIOD      Moves between gravity inversions, 0 for classic rules [default: 5]
  REQUIRE_LOGIN            Gate game pages behind a session [default: true]
  MAX_GAMES                Upper bound on live games [default: 1000]
  METRICS_BIND             Prometheus exporter address [default: disabled]
  (See .env.example for all configuration options)
";

/// How often expired sessions are swept
const SESSION_PURGE_INTERVAL: StdDuration = StdDuration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{}/metrics", addr);
    }

    // User store
    let (database, users): (Option<Database>, Arc<dyn UserRepository>) = match &config.database {
        Some(db_config) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            let repo = db
                .user_repository()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to prepare users table: {}", e))?;
            info!("Database connected successfully");
            (Some(db), Arc::new(repo) as Arc<dyn UserRepository>)
        }
        None => {
            warn!("DATABASE_URL not set, accounts are kept in memory and lost on restart");
            (None, Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>)
        }
    };

    let sessions = Arc::new(SessionStore::new(
        Duration::hours(config.session.ttl_hours),
        config.session.max_entries,
    ));
    let auth_manager = Arc::new(AuthManager::new(
        users,
        sessions.clone(),
        config.security.password_pepper.clone(),
    ));

    let registry = Arc::new(GameRegistry::new(config.game.clone())?.with_max_games(config.max_games));
    match config.game.gravity_flip_period {
        Some(period) => info!(
            "Games are {}x{} connect {}, gravity inverts every {} moves",
            config.game.rows, config.game.cols, config.game.connect, period
        ),
        None => info!(
            "Games are {}x{} connect {}, classic rules",
            config.game.rows, config.game.cols, config.game.connect
        ),
    }
    if !config.session.require_login {
        warn!("REQUIRE_LOGIN is off, game routes are open to guests");
    }

    tokio::spawn(purge_sessions(sessions));

    let state = api::AppState {
        auth_manager,
        registry,
        database: database.clone(),
        require_login: config.session.require_login,
        assets_dir: config.assets_dir.clone(),
    };
    state.refresh_gauges().await;

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Sweep expired sessions in the background
async fn purge_sessions(sessions: Arc<SessionStore>) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        let purged = sessions.purge_expired().await;
        if purged > 0 {
            info!("Purged {} expired sessions", purged);
        }
        metrics::active_sessions(sessions.len().await);
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
