//! Authentication module providing user registration, login, and sessions.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - Opaque session tokens with a 24-hour lifetime
//! - A bounded session store with lazy eviction of expired entries
//!
//! ## Example
//!
//! ```no_run
//! use power4::auth::{AuthManager, RegisterRequest, SessionStore};
//! use power4::db::InMemoryUserRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(InMemoryUserRepository::new()),
//!         Arc::new(SessionStore::default()),
//!         "secret_pepper".to_string(),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "player1".to_string(),
//!         password: "SecurePass123".to_string(),
//!     };
//!
//!     let (user, session) = auth.register_and_login(request).await?;
//!     println!("Registered {} with session {}", user.username, session.token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod session;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{LoginRequest, RegisterRequest, Session, User, UserId, UserRecord};
pub use session::SessionStore;
