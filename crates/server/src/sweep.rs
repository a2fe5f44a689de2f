//! Periodic removal of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use gate_core::SessionManager;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Sweep `sessions` every `every` until the task is aborted.
///
/// Expired sessions are already rejected on read; the sweep only bounds
/// store growth.
pub fn spawn_session_sweep(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            match sessions.cleanup_expired_sessions() {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Swept expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}
