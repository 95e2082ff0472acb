//! Periodic eviction of idle rate-limit windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::observability::metrics;
use crate::security::RateLimiter;

/// Spawn the sweeper. It stops when `shutdown` fires or its sender is dropped.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing to sweep yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = limiter.sweep();
                    let tracked = limiter.len();
                    metrics::record_rate_limit_windows(tracked, evicted);
                    if evicted > 0 {
                        tracing::debug!(evicted, tracked, "Swept idle rate-limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
