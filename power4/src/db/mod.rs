//! Persistent user storage.
//!
//! `Database` owns the sqlx pool; accounts go through the `UserRepository`
//! trait so the server can fall back to an in-memory store.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod repository;

pub use config::DatabaseConfig;
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};

/// Handle on the PostgreSQL pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect with the pool limits and timeouts from `config`.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), sqlx::Error> {
    /// let db = power4::db::Database::new(&power4::db::DatabaseConfig::development()).await?;
    /// let users = db.user_repository().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Repository over this pool; creates the `users` table when missing
    pub async fn user_repository(&self) -> Result<PgUserRepository, sqlx::Error> {
        let repo = PgUserRepository::new(self.pool.clone());
        repo.migrate().await?;
        Ok(repo)
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
