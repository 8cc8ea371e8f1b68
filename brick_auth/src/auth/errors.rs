//! Authentication error types.

use std::time::Duration;

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A store query did not finish in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Password hashing or verification could not run
    #[error("Password hashing failed")]
    HashingFailed,

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Username or email already registered
    #[error("Username or email already exists")]
    Duplicate,

    /// Unknown identifier or wrong password. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No live session, or the session's user no longer exists
    #[error("Not authenticated")]
    Unauthenticated,
}

impl AuthError {
    /// Whether the error is a server-side failure the caller cannot fix.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Database(_) | AuthError::Timeout(_) | AuthError::HashingFailed
        )
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage and hashing failures collapse to a generic message so SQL text
    /// and driver details never reach a response body.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => AuthError::Timeout(duration),
            TimeoutError::Database(e) => AuthError::Database(e),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_sanitized() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert!(err.is_internal());
        assert_eq!(err.client_message(), "Internal server error");

        let err = AuthError::Timeout(Duration::from_secs(5));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("5s"));

        assert_eq!(
            AuthError::HashingFailed.client_message(),
            "Internal server error"
        );
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AuthError::Validation("Username and password are required".to_string());
        assert!(!err.is_internal());
        assert_eq!(err.client_message(), "Username and password are required");

        assert_eq!(
            AuthError::InvalidCredentials.client_message(),
            "Invalid credentials"
        );
        assert_eq!(
            AuthError::Duplicate.client_message(),
            "Username or email already exists"
        );
    }

    #[test]
    fn test_timeout_error_conversion() {
        let err: AuthError = TimeoutError::Timeout(Duration::from_secs(2)).into();
        assert!(matches!(err, AuthError::Timeout(d) if d == Duration::from_secs(2)));

        let err: AuthError = TimeoutError::Database(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, AuthError::Database(sqlx::Error::PoolClosed)));
    }
}
