//! Background sweep of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use brick_auth::db::SessionRepository;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::metrics;

/// Spawn a task that deletes expired sessions every `every`.
///
/// Reads already ignore expired sessions; the sweep only keeps the table from
/// growing with sessions nobody comes back for. Failures are logged and the
/// task keeps running.
pub fn spawn_session_gc(sessions: Arc<dyn SessionRepository>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!(purged = count, "Removed expired sessions");
                    metrics::sessions_purged_total(count);
                }
                Err(e) => tracing::warn!(error = %e, "Expired session sweep failed"),
            }
        }
    })
}
