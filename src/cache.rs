// Last-known-good metrics per container

use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::ContainerMetrics;

/// Idle limit used when none is configured.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(300);

/// Write-through store of the latest successful sample per container, keyed by short id.
pub trait MetricsCache: Send + Sync {
    fn put(&self, id: &str, metrics: ContainerMetrics);

    fn get(&self, id: &str) -> Option<ContainerMetrics>;

    /// Records one complete fleet listing. Entries missing from `present` for too
    /// many consecutive listings are dropped; returns how many were evicted.
    fn sweep(&self, present: &HashSet<String>) -> usize;

    /// Drops entries that have not been written for longer than the idle limit.
    fn expire(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Slot {
    metrics: ContainerMetrics,
    missed_passes: u32,
    written_at: Instant,
}

/// Process-wide cache backed by a concurrent map; concurrent samples write independent keys.
#[derive(Debug)]
pub struct InMemoryMetricsCache {
    entries: DashMap<String, Slot>,
    evict_after_passes: u32,
    max_idle: Duration,
}

impl InMemoryMetricsCache {
    pub fn new(evict_after_passes: u32) -> Self {
        Self {
            entries: DashMap::new(),
            evict_after_passes: evict_after_passes.max(1),
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Entries not refreshed within `max_idle` are dropped by [`MetricsCache::expire`].
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }
}

impl MetricsCache for InMemoryMetricsCache {
    fn put(&self, id: &str, metrics: ContainerMetrics) {
        self.entries.insert(
            id.to_string(),
            Slot {
                metrics,
                missed_passes: 0,
                written_at: Instant::now(),
            },
        );
    }

    fn get(&self, id: &str) -> Option<ContainerMetrics> {
        self.entries.get(id).map(|slot| slot.metrics.clone())
    }

    fn sweep(&self, present: &HashSet<String>) -> usize {
        let before = self.entries.len();
        let limit = self.evict_after_passes;
        self.entries.retain(|id, slot| {
            if present.contains(id) {
                slot.missed_passes = 0;
                true
            } else {
                slot.missed_passes += 1;
                slot.missed_passes < limit
            }
        });
        before.saturating_sub(self.entries.len())
    }

    fn expire(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        let max_idle = self.max_idle;
        self.entries
            .retain(|_, slot| now.saturating_duration_since(slot.written_at) <= max_idle);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
