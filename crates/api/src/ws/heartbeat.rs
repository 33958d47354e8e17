//! Periodic ping and idle sweep for edit-lock connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;

use super::EditLockCoordinator;

/// Seconds between heartbeat pings.
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn the heartbeat task: every interval, ping all connections and drop
/// the ones that have been silent longer than `idle_timeout`.
pub fn start_heartbeat(
    coordinator: Arc<EditLockCoordinator>,
    idle_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        // First tick fires immediately; skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            coordinator.ping_all().await;

            let swept = coordinator.sweep_idle(idle_timeout).await;
            if swept > 0 {
                tracing::info!(swept, "Swept idle edit-lock connections");
            }
        }
    })
}
