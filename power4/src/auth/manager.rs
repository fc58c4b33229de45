//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{LoginRequest, RegisterRequest, Session, User},
    session::SessionStore,
};
use crate::db::UserRepository;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
    pepper: String,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User store
    /// * `sessions` - Session store
    /// * `pepper` - Server-side pepper for password hashing
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<SessionStore>, pepper: String) -> Self {
        Self {
            users,
            sessions,
            pepper,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::WeakPassword` - Password too short
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;

        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .users
            .create_user(&request.username, &password_hash)
            .await?;

        log::info!("Registered user {}", user.username);

        Ok(user)
    }

    /// Check credentials and open a session
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - User doesn't exist
    /// * `AuthError::InvalidPassword` - Incorrect password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, Session)> {
        let record = self
            .users
            .find_by_username(&request.username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.verify_password(&request.password, &record.password_hash)?;

        let session = self.sessions.create(&record.user.username).await;
        Ok((record.user, session))
    }

    /// Register and log in in one step
    pub async fn register_and_login(&self, request: RegisterRequest) -> AuthResult<(User, Session)> {
        let user = self.register(request).await?;
        let session = self.sessions.create(&user.username).await;
        Ok((user, session))
    }

    /// Close a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) {
        self.sessions.revoke(token).await;
    }

    /// Username of the session behind `token`, if it is still valid
    pub async fn resolve_session(&self, token: &str) -> Option<String> {
        self.sessions.resolve(token).await
    }

    /// Number of registered accounts
    pub async fn user_count(&self) -> AuthResult<i64> {
        self.users.count().await
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidPassword)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidPassword)
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.len();
    if !(3..=20).contains(&len) {
        return Err(AuthError::InvalidUsername(
            "Username must be 3-20 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
