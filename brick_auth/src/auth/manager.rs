//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    hasher::CredentialHasher,
    models::{LoginRequest, RegisterRequest, SessionHandle, User},
};
use crate::db::repository::{SessionRepository, UserRepository};
use std::sync::Arc;

/// Authentication manager
///
/// Sole owner of the business rules around registration, login and sessions.
/// Callers see `User` values and opaque session ids, never password hashes or
/// storage rows.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: CredentialHasher,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User store
    /// * `sessions` - Session store
    /// * `hasher` - Password hasher (carries the server-side pepper)
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Username, email or password is empty
    /// * `AuthError::Duplicate` - Username or email already exists
    /// * `AuthError::HashingFailed` - Password could not be hashed
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty()
        {
            return Err(AuthError::Validation(
                "Username, email, and password are required".to_string(),
            ));
        }

        let password_hash = self.hash_password(request.password).await?;

        let user = self
            .users
            .create_user(&request.username, &request.email, &password_hash)
            .await?;

        log::info!("Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Login a user and open a session
    ///
    /// `request.username` is tried as a username first, then as an email.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Identifier or password is empty
    /// * `AuthError::InvalidCredentials` - Unknown user or wrong password;
    ///   the two cases are indistinguishable
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, SessionHandle)> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let record = match self.users.find_by_username(&request.username).await? {
            Some(record) => Some(record),
            None => self.users.find_by_email(&request.username).await?,
        };

        let Some(record) = record else {
            log::debug!("Login failed: no user matches the given identifier");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(request.password, record.password_hash)
            .await?
        {
            log::debug!("Login failed: wrong password for user {}", record.user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.create_session(record.user.id).await?;
        log::info!("User {} logged in", record.user.id);

        Ok((record.user, session))
    }

    /// Logout by destroying the session. An unknown session is already
    /// logged out and succeeds.
    pub async fn logout(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.destroy_session(session_id).await
    }

    /// Resolve a session id to its user
    ///
    /// A missing or expired session, or one whose user no longer exists, is
    /// destroyed before reporting `Unauthenticated`.
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthenticated` - No live session for a live user
    pub async fn current_user(&self, session_id: &str) -> AuthResult<User> {
        let Some(session) = self.sessions.get_session(session_id).await? else {
            self.sessions.destroy_session(session_id).await?;
            return Err(AuthError::Unauthenticated);
        };

        match self.users.find_by_id(session.user_id).await? {
            Some(record) => Ok(record.user),
            None => {
                log::warn!(
                    "Session references missing user {}; destroying it",
                    session.user_id
                );
                self.sessions.destroy_session(session_id).await?;
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Hash on the blocking pool so Argon2 does not stall request workers.
    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                log::error!("Password hashing task failed: {e}");
                AuthError::HashingFailed
            })?
    }

    async fn verify_password(&self, password: String, hash: String) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                log::error!("Password verification task failed: {e}");
                AuthError::HashingFailed
            })?
    }
}
