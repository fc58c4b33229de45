//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Password verification failed
    #[error("Wrong password")]
    InvalidPassword,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error comes from the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Database(_) | AuthError::HashingFailed)
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_is_sanitized() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_credential_errors_are_exposed() {
        assert_eq!(AuthError::UserNotFound.client_message(), "User not found");
        assert_eq!(AuthError::InvalidPassword.client_message(), "Wrong password");
        assert!(AuthError::UsernameTaken.is_client_error());
    }
}
