//! Prometheus metrics for monitoring authentication traffic.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until an
//! exporter is installed with [`init_metrics`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use brick_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::login_attempts_total(true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment registrations counter. `outcome` is `created`, `duplicate`,
/// `invalid` or `error`.
pub fn registrations_total(outcome: &'static str) {
    metrics::counter!("registrations_total", "outcome" => outcome).increment(1);
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment logouts counter.
pub fn logouts_total() {
    metrics::counter!("logouts_total").increment(1);
}

/// Increment stale-session counter (expired, unknown, or user deleted).
pub fn stale_sessions_total() {
    metrics::counter!("stale_sessions_total").increment(1);
}

/// Add to the count of sessions removed by the background sweep.
pub fn sessions_purged_total(count: u64) {
    metrics::counter!("sessions_purged_total").increment(count);
}
