// Fleet aggregation: list, fan out sampling, fan in, summarize

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::MetricsCache;
use crate::inspector::RuntimeInspector;
use crate::lister::ContainerLister;
use crate::models::{AggregatedSnapshot, ContainerEntry, ContainerMetrics};
use crate::publisher::SnapshotSource;
use crate::sampler::{Sampler, round2};

/// Labels and timeouts the engine is built with.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub platform_label: String,
    pub owner_label_key: String,
    pub sample_timeout: Duration,
}

pub struct AggregationEngine {
    lister: ContainerLister,
    sampler: Sampler,
    cache: Arc<dyn MetricsCache>,
}

impl AggregationEngine {
    pub fn new(
        inspector: Arc<dyn RuntimeInspector>,
        cache: Arc<dyn MetricsCache>,
        settings: EngineSettings,
    ) -> Self {
        let lister = ContainerLister::new(
            inspector.clone(),
            settings.platform_label,
            settings.owner_label_key,
        );
        let sampler = Sampler::new(inspector, cache.clone(), settings.sample_timeout);
        Self {
            lister,
            sampler,
            cache,
        }
    }

    /// Fresh sample of a single container, bypassing the listing.
    pub async fn sample_one(&self, id: &str) -> ContainerMetrics {
        self.sampler.sample(id).await
    }

    /// One aggregation pass. Running containers are sampled concurrently; the
    /// result keeps the lister's order. Failed samples count in the totals but
    /// not in the averages.
    #[instrument(skip(self), fields(operation = "aggregate"))]
    pub async fn aggregate(&self, owner: Option<&str>) -> AggregatedSnapshot {
        let listing = self.lister.try_list(owner).await;

        let expired = self.cache.expire();
        if expired > 0 {
            debug!(expired, "expired idle cached metrics");
        }

        let descriptors = match listing {
            Ok(descriptors) => descriptors,
            Err(e) => {
                // An outage says nothing about which containers still exist.
                warn!(
                    error = %e,
                    operation = "list_containers",
                    owner = owner.unwrap_or("*"),
                    "container listing failed; reporting empty fleet"
                );
                return AggregatedSnapshot::empty();
            }
        };

        // Only a complete listing can prove a container is gone; a filtered one sees one owner.
        if owner.is_none() {
            let present: HashSet<String> = descriptors.iter().map(|d| d.id.clone()).collect();
            let evicted = self.cache.sweep(&present);
            if evicted > 0 {
                debug!(evicted, "evicted cached metrics for vanished containers");
            }
        }

        if descriptors.is_empty() {
            return AggregatedSnapshot::empty();
        }

        let samples = join_all(
            descriptors
                .iter()
                .filter(|d| d.status.is_running())
                .map(|d| self.sampler.sample(&d.full_id)),
        )
        .await;

        let running_containers = samples.len();
        let (cpu_sum, memory_sum, valid) = samples
            .iter()
            .filter(|m| m.is_valid())
            .fold((0.0, 0.0, 0usize), |(cpu, mem, n), m| {
                (cpu + m.cpu_percent, mem + m.memory_percent, n + 1)
            });
        let (average_cpu_percent, average_memory_percent) = if valid > 0 {
            (
                round2(cpu_sum / valid as f64),
                round2(memory_sum / valid as f64),
            )
        } else {
            (0.0, 0.0)
        };

        let mut samples = samples.into_iter();
        let containers: Vec<ContainerEntry> = descriptors
            .into_iter()
            .map(|container| {
                let metrics = if container.status.is_running() {
                    samples
                        .next()
                        .unwrap_or_else(|| ContainerMetrics::stopped(&container.id))
                } else {
                    ContainerMetrics::stopped(&container.id)
                };
                let last_known = if metrics.error.is_some() {
                    self.cache.get(&container.id)
                } else {
                    None
                };
                ContainerEntry {
                    container,
                    metrics,
                    last_known,
                }
            })
            .collect();

        let total_containers = containers.len();
        debug!(
            total_containers,
            running_containers,
            valid_samples = valid,
            "aggregation pass complete"
        );

        AggregatedSnapshot {
            average_cpu_percent,
            average_memory_percent,
            total_containers,
            running_containers,
            stopped_containers: total_containers - running_containers,
            containers,
            generated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SnapshotSource for AggregationEngine {
    async fn snapshot(&self, owner: Option<&str>) -> anyhow::Result<AggregatedSnapshot> {
        Ok(self.aggregate(owner).await)
    }
}
