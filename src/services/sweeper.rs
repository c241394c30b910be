//! Periodic overdue sweep

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::lending::LendingService;

/// Spawn a task that runs the overdue sweep every `interval_secs`.
///
/// Returns `None` when `interval_secs` is 0. The first sweep happens one full
/// interval after spawning.
pub fn spawn_overdue_sweeper(
    lending: Arc<LendingService>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Background overdue sweep disabled");
        return None;
    }

    let period = Duration::from_secs(interval_secs);
    tracing::info!(interval_secs, "Starting background overdue sweep");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let blocked = lending.overdue_sweep().await;
            if !blocked.is_empty() {
                tracing::info!(users = ?blocked, "Users blocked for overdue loans");
            }
        }
    }))
}
