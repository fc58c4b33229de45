//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use power4::{
    GameConfig,
    auth::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_HOURS},
    db::DatabaseConfig,
    game::{
        DEFAULT_COLS, DEFAULT_CONNECT, DEFAULT_GRAVITY_FLIP_PERIOD, DEFAULT_MAX_GAMES,
        DEFAULT_ROWS, GameConfigError, MAX_DIMENSION,
    },
};
use std::{net::SocketAddr, path::PathBuf};

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Minimum pepper length
pub const MIN_PEPPER_LENGTH: usize = 16;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration; `None` keeps users in memory
    pub database: Option<DatabaseConfig>,
    /// Security configuration
    pub security: SecurityConfig,
    /// Rules for every game the server creates
    pub game: GameConfig,
    /// Upper bound on live games, the default game included
    pub max_games: usize,
    /// Session configuration
    pub session: SessionConfig,
    /// Directory served under `/assets`
    pub assets_dir: PathBuf,
    /// Prometheus exporter address; `None` disables the exporter
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub max_entries: usize,
    /// Whether game routes need a logged-in user
    pub require_login: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_entries: DEFAULT_MAX_SESSIONS,
            require_login: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr(&lookup, "SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))),
        };

        // Database configuration (optional)
        let database = database_url_override
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(|database_url| {
                let defaults = DatabaseConfig::development();
                DatabaseConfig {
                    database_url,
                    max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
                    min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections),
                    connection_timeout_secs: parse_or(
                        &lookup,
                        "DB_CONNECTION_TIMEOUT_SECS",
                        defaults.connection_timeout_secs,
                    ),
                    idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
                    max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
                }
            });

        // Security configuration (REQUIRED)
        let password_pepper = lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
            var: "PASSWORD_PEPPER".to_string(),
            hint: "Generate with: openssl rand -hex 16".to_string(),
        })?;

        // Game rules
        let flip_period: u32 = parse_or(&lookup, "GRAVITY_FLIP_PERIOD", DEFAULT_GRAVITY_FLIP_PERIOD);
        let game = GameConfig {
            rows: parse_or(&lookup, "BOARD_ROWS", DEFAULT_ROWS),
            cols: parse_or(&lookup, "BOARD_COLS", DEFAULT_COLS),
            connect: parse_or(&lookup, "CONNECT_LENGTH", DEFAULT_CONNECT),
            gravity_flip_period: (flip_period > 0).then_some(flip_period),
        };

        let max_games = parse_or(&lookup, "MAX_GAMES", DEFAULT_MAX_GAMES);

        let session = SessionConfig {
            ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
            max_entries: parse_or(&lookup, "SESSION_MAX_ENTRIES", DEFAULT_MAX_SESSIONS),
            require_login: parse_or(&lookup, "REQUIRE_LOGIN", true),
        };

        let assets_dir = lookup("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));

        let metrics_bind = parse_addr(&lookup, "METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            security: SecurityConfig { password_pepper },
            game,
            max_games,
            session,
            assets_dir,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.password_pepper.len() < MIN_PEPPER_LENGTH {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: format!("Must be at least {MIN_PEPPER_LENGTH} characters"),
            });
        }

        if let Err(err) = self.game.validate() {
            let var = match err {
                GameConfigError::EmptyBoard { .. } | GameConfigError::BoardTooLarge { .. } => {
                    if self.game.rows == 0 || self.game.rows > MAX_DIMENSION {
                        "BOARD_ROWS"
                    } else {
                        "BOARD_COLS"
                    }
                }
                GameConfigError::InvalidConnect { .. } => "CONNECT_LENGTH",
                GameConfigError::InvalidFlipPeriod => "GRAVITY_FLIP_PERIOD",
            };
            return Err(ConfigError::Invalid {
                var: var.to_string(),
                reason: err.to_string(),
            });
        }

        if self.max_games == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_GAMES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.session.ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.session.max_entries == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_ENTRIES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(database) = &self.database
            && database.min_connections > database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Addresses are not defaulted silently: a typo there should stop startup.
fn parse_addr<F>(lookup: &F, key: &str) -> Result<Option<SocketAddr>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not a valid IP:PORT address"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), None, None)
    }

    const PEPPER: (&str, &str) = ("PASSWORD_PEPPER", "0123456789abcdef");

    #[test]
    fn test_defaults() {
        let config = load(&[PEPPER]).unwrap();

        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert!(config.database.is_none());
        assert_eq!(config.game, GameConfig::default());
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert!(config.metrics_bind.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_pepper() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "PASSWORD_PEPPER"));
    }

    #[test]
    fn test_short_pepper_rejected() {
        let config = load(&[("PASSWORD_PEPPER", "short")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "PASSWORD_PEPPER".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PASSWORD_PEPPER"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_flip_period_zero_disables_variant() {
        let config = load(&[PEPPER, ("GRAVITY_FLIP_PERIOD", "0")]).unwrap();
        assert_eq!(config.game.gravity_flip_period, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_game_overrides() {
        let config = load(&[
            PEPPER,
            ("BOARD_ROWS", "8"),
            ("BOARD_COLS", "9"),
            ("CONNECT_LENGTH", "5"),
            ("GRAVITY_FLIP_PERIOD", "7"),
        ])
        .unwrap();
        assert_eq!(
            config.game,
            GameConfig {
                rows: 8,
                cols: 9,
                connect: 5,
                gravity_flip_period: Some(7),
            }
        );
    }

    #[test]
    fn test_connect_longer_than_board_rejected() {
        let config = load(&[PEPPER, ("BOARD_ROWS", "3"), ("BOARD_COLS", "3")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "CONNECT_LENGTH"));
    }

    #[test]
    fn test_board_dimensions_are_bounded() {
        let config = load(&[PEPPER, ("BOARD_ROWS", "8589934592"), ("BOARD_COLS", "8589934592")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BOARD_ROWS"));
        // The same config must not panic when a registry is built from it
        assert!(power4::GameRegistry::new(config.game).is_err());

        let config = load(&[PEPPER, ("BOARD_COLS", "65")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BOARD_COLS"));

        let config = load(&[PEPPER, ("BOARD_ROWS", "0")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BOARD_ROWS"));

        let config = load(&[PEPPER, ("BOARD_ROWS", "64"), ("BOARD_COLS", "64")]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_games() {
        let config = load(&[PEPPER]).unwrap();
        assert_eq!(config.max_games, DEFAULT_MAX_GAMES);

        let config = load(&[PEPPER, ("MAX_GAMES", "25")]).unwrap();
        assert_eq!(config.max_games, 25);
        assert!(config.validate().is_ok());

        let config = load(&[PEPPER, ("MAX_GAMES", "0")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "MAX_GAMES"));
    }

    #[test]
    fn test_bad_bind_address_is_an_error() {
        let err = load(&[PEPPER, ("SERVER_BIND", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SERVER_BIND"));
    }

    #[test]
    fn test_database_url_enables_pool_settings() {
        let config = load(&[
            PEPPER,
            ("DATABASE_URL", "postgres://u@h/db"),
            ("DB_MAX_CONNECTIONS", "20"),
        ])
        .unwrap();
        let database = config.database.unwrap();
        assert_eq!(database.database_url, "postgres://u@h/db");
        assert_eq!(database.max_connections, 20);
        assert_eq!(database.min_connections, 1);
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let vars = [PEPPER, ("SERVER_BIND", "0.0.0.0:1"), ("DATABASE_URL", "postgres://env")];
        let lookup = |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        };
        let config = ServerConfig::from_lookup(
            lookup,
            Some("127.0.0.1:9999".parse().unwrap()),
            Some("postgres://cli".to_string()),
        )
        .unwrap();

        assert_eq!(config.bind.port(), 9999);
        assert_eq!(config.database.unwrap().database_url, "postgres://cli");
    }

    #[test]
    fn test_require_login_toggle() {
        let config = load(&[PEPPER, ("REQUIRE_LOGIN", "false"), ("SESSION_TTL_HOURS", "2")]).unwrap();
        assert!(!config.session.require_login);
        assert_eq!(config.session.ttl_hours, 2);
    }
}
