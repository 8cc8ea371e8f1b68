//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber for the server. Records emitted through the
//! `log` facade by `brick_auth` are forwarded into the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use brick_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `request_id` - Optional request correlation id
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use brick_server::logging::log_security_event;
///
/// log_security_event("failed_login", None, Some("2f1c..."), "Invalid credentials");
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<i64>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}

/// Log API request/response
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    tracing::info!(
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some(1), Some("req-1"), "Test message");
        log_security_event("test_event", None, None, "Test message");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/me", 200, 45);
        log_api_request("POST", "/api/login", 401, 120);
    }
}
