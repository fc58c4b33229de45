//! Repository trait definitions for the user store.
//!
//! The trait lets the server run against PostgreSQL in production and an
//! in-memory map in development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::auth::{AuthError, AuthResult, User, UserId, UserRecord};

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User>;

    /// Find user (with password hash) by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>>;

    /// Number of registered users
    async fn count(&self) -> AuthResult<i64>;
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error) -> AuthError {
    let unique = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if unique {
        AuthError::UsernameTaken
    } else {
        AuthError::Database(err)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             RETURNING id, username, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserRecord {
            user: User {
                id: r.get("id"),
                username: r.get("username"),
                created_at: r.get::<DateTime<Utc>, _>("created_at"),
            },
            password_hash: r.get("password_hash"),
        }))
    }

    async fn count(&self) -> AuthResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}

/// In-memory implementation of `UserRepository`
///
/// Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: RwLock<UserId>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let user = User {
            id: *next_id,
            username: username.to_string(),
            created_at: Utc::now(),
        };
        drop(next_id);

        users.insert(
            username.to_string(),
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn count(&self) -> AuthResult<i64> {
        let users = self.users.read().await;
        Ok(users.len() as i64)
    }
}
