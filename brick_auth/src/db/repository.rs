//! Repository trait definitions for the user and session stores.
//!
//! The auth manager only talks to these traits, so the SQLite implementations
//! can be swapped for the in-crate mocks in unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use super::timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout};
use crate::auth::{AuthError, AuthResult, Session, SessionHandle, User, UserId, UserRecord};

/// Random bytes in a session id before hex encoding (32 bytes = 64 hex chars).
const SESSION_ID_BYTES: usize = 32;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    ///
    /// Fails with `AuthError::Duplicate` when the username or email is
    /// already taken. The check and the insert are one atomic statement.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AuthResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>>;

    /// Find user by exact, case-sensitive username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>>;

    /// Find user by exact, case-sensitive email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>>;
}

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session for `user_id` expiring one TTL from now.
    async fn create_session(&self, user_id: UserId) -> AuthResult<SessionHandle>;

    /// Fetch a live session. Expired records are deleted and reported as `None`.
    async fn get_session(&self, session_id: &str) -> AuthResult<Option<Session>>;

    /// Delete a session. Deleting an unknown id is not an error.
    async fn destroy_session(&self, session_id: &str) -> AuthResult<()>;

    /// Delete every expired session, returning how many were removed.
    async fn purge_expired(&self) -> AuthResult<u64>;
}

/// Generate a fresh opaque session id for the cookie.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest under which a session id is stored.
pub fn session_digest(session_id: &str) -> String {
    hex::encode(Sha256::digest(session_id.as_bytes()))
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn user_record_from_row(row: &SqliteRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        user: User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
            updated_at: row.try_get::<NaiveDateTime, _>("updated_at")?.and_utc(),
        },
        password_hash: row.try_get("password_hash")?,
    })
}

/// SQLite implementation of `UserRepository`
pub struct SqliteUserRepository {
    pool: SqlitePool,
    query_timeout: std::time::Duration,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: std::time::Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    async fn find_one(&self, column: &str, value: &str) -> AuthResult<Option<UserRecord>> {
        let sql = format!(
            "SELECT id, username, email, password_hash, created_at, updated_at
             FROM users WHERE {column} = ?"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql).bind(value).fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| user_record_from_row(&r)).transpose()?)
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AuthResult<User> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)
                 RETURNING id, username, email, password_hash, created_at, updated_at",
            )
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                AuthError::Duplicate
            } else {
                AuthError::from(e)
            }
        })?;

        Ok(user_record_from_row(&row)?.user)
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, username, email, password_hash, created_at, updated_at
                 FROM users WHERE id = ?",
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| user_record_from_row(&r)).transpose()?)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        self.find_one("email", email).await
    }
}

/// SQLite implementation of `SessionRepository`
///
/// Rows are keyed by [`session_digest`] of the cookie value; timestamps are
/// unix seconds.
pub struct SqliteSessionRepository {
    pool: SqlitePool,
    ttl: Duration,
    query_timeout: std::time::Duration,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: std::time::Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    async fn delete_digest(&self, digest: &str) -> AuthResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM sessions WHERE id_hash = ?")
                .bind(digest)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, user_id: UserId) -> AuthResult<SessionHandle> {
        let session_id = generate_session_id();
        let now = Utc::now();
        let expires_at = now + self.ttl;

        with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO sessions (id_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            )
            .bind(session_digest(&session_id))
            .bind(user_id)
            .bind(now.timestamp())
            .bind(expires_at.timestamp())
            .execute(&self.pool),
        )
        .await?;

        Ok(SessionHandle {
            id: session_id,
            user_id,
            expires_at,
        })
    }

    async fn get_session(&self, session_id: &str) -> AuthResult<Option<Session>> {
        let digest = session_digest(session_id);
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT user_id, created_at, expires_at FROM sessions WHERE id_hash = ?")
                .bind(&digest)
                .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let session = Session {
            user_id: row.try_get("user_id")?,
            created_at: from_unix(row.try_get("created_at")?),
            expires_at: from_unix(row.try_get("expires_at")?),
        };

        if session.is_expired_at(Utc::now()) {
            log::debug!("Dropping expired session for user {}", session.user_id);
            self.delete_digest(&digest).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn destroy_session(&self, session_id: &str) -> AuthResult<()> {
        self.delete_digest(&session_digest(session_id)).await
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
                .bind(Utc::now().timestamp())
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_long_and_unique() {
        let first = generate_session_id();
        let second = generate_session_id();

        assert_eq!(first.len(), SESSION_ID_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_session_digest_is_stable_and_differs_from_id() {
        let id = generate_session_id();

        assert_eq!(session_digest(&id), session_digest(&id));
        assert_ne!(session_digest(&id), id);
        assert_eq!(session_digest(&id).len(), 64);
    }
}
