//! HTTP server for cookie-session authentication.
//!
//! Wires the [`brick_auth`] service into an axum router, together with
//! configuration loading, structured logging, Prometheus metrics and the
//! background sweep of expired sessions.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod session_gc;
