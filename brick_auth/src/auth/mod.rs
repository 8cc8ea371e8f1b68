//! Authentication module providing user registration, login, and session management.
//!
//! This module implements cookie-session authentication with:
//! - Argon2id password hashing with an optional server-side pepper
//! - Login by username or email with a single undifferentiated failure
//! - Server-side sessions with a fixed expiration window
//! - Self-healing identity lookup that destroys stale sessions
//!
//! ## Example
//!
//! ```no_run
//! use brick_auth::auth::{AuthManager, CredentialHasher, LoginRequest, RegisterRequest};
//! use brick_auth::db::{Database, DatabaseConfig, SqliteSessionRepository, SqliteUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::development()).await?;
//!     db.migrate().await?;
//!
//!     let auth = AuthManager::new(
//!         Arc::new(SqliteUserRepository::new(db.pool().clone())),
//!         Arc::new(SqliteSessionRepository::new(db.pool().clone(), chrono::Duration::hours(24))),
//!         CredentialHasher::default(),
//!     );
//!
//!     let user = auth
//!         .register(RegisterRequest {
//!             username: "alice".to_string(),
//!             email: "a@x.com".to_string(),
//!             password: "secret123".to_string(),
//!         })
//!         .await?;
//!
//!     let (_, session) = auth
//!         .login(LoginRequest {
//!             username: "a@x.com".to_string(),
//!             password: "secret123".to_string(),
//!         })
//!         .await?;
//!
//!     assert_eq!(auth.current_user(&session.id).await?.id, user.id);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod hasher;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use hasher::CredentialHasher;
pub use manager::AuthManager;
pub use models::{LoginRequest, RegisterRequest, Session, SessionHandle, User, UserId, UserRecord};
