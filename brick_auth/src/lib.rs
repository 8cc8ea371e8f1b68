//! # Brick Auth
//!
//! Session-based authentication core: registers users, verifies credentials
//! at login, and keeps server-side sessions that a transport layer ties to
//! browser cookies.
//!
//! ## Core Modules
//!
//! - [`auth`]: Credential hashing, request/identity models and the [`AuthManager`]
//! - [`db`]: SQLite pool, schema setup, and the user/session stores behind
//!   the [`UserRepository`] and [`SessionRepository`] traits
//!
//! The manager receives its stores by injection; nothing in this crate keeps
//! global connection state.

/// Authentication rules, hashing and models.
pub mod auth;
pub use auth::{AuthError, AuthManager, AuthResult, CredentialHasher, User};

/// Connection pooling and persistence.
pub mod db;
pub use db::{Database, DatabaseConfig, SessionRepository, UserRepository};
