// Background app-stats logger: live subscriber count and cache size at a fixed real-time interval.
// Each tick also expires idle cache entries.

use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::cache::MetricsCache;
use crate::publisher::LivePublisher;

pub struct StatsLogDeps {
    pub publisher: Arc<LivePublisher>,
    pub cache: Arc<dyn MetricsCache>,
    pub shutdown: CancellationToken,
}

pub fn spawn_stats_log(deps: StatsLogDeps, every: Duration) -> tokio::task::JoinHandle<()> {
    let StatsLogDeps {
        publisher,
        cache,
        shutdown,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing to report yet.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Stats logger shutting down");
                    break;
                }
                _ = tick.tick() => {
                    // Entries written only by single-container queries never show up in a listing.
                    let expired = cache.expire();
                    tracing::info!(
                        expired_cache_entries = expired,
                        live_subscribers = publisher.active_subscriptions(),
                        cached_containers = cache.len(),
                        "app stats"
                    );
                }
            }
        }
    })
}
