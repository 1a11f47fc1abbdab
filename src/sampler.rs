// Per-container utilization sampling

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::MetricsCache;
use crate::error::RuntimeError;
use crate::format::format_bytes;
use crate::inspector::RuntimeInspector;
use crate::models::{ContainerMetrics, CounterPair, short_id};

pub const NOT_RUNNING: &str = "Container is not running";

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turns one current/previous counter pair into bounded percentages and totals.
///
/// CPU is `cpuDelta / systemDelta * onlineCpus * 100`, zero whenever either delta is
/// not positive (first reading, counter reset). Both percentages are clamped to
/// `[0, 100]` and rounded to two decimals.
pub fn compute_metrics(container_id: &str, pair: &CounterPair) -> ContainerMetrics {
    let current = &pair.current;
    let previous = &pair.previous;

    let cpu_delta = current.cpu_total_usage_nanos as i128 - previous.cpu_total_usage_nanos as i128;
    let system_delta =
        current.system_cpu_usage_nanos as i128 - previous.system_cpu_usage_nanos as i128;
    let cpu_count = current.online_cpu_count.max(1) as f64;
    let cpu_percent = if system_delta > 0 && cpu_delta > 0 {
        (cpu_delta as f64 / system_delta as f64) * cpu_count * 100.0
    } else {
        0.0
    };

    let memory_usage = current.memory_usage_bytes;
    let memory_limit = current.memory_limit_bytes;
    let memory_percent = memory_usage as f64 / memory_limit.max(1) as f64 * 100.0;

    let (network_rx, network_tx) = current
        .network_interfaces
        .values()
        .fold((0u64, 0u64), |(rx, tx), iface| {
            (
                rx.saturating_add(iface.rx_bytes),
                tx.saturating_add(iface.tx_bytes),
            )
        });

    ContainerMetrics {
        container_id: short_id(container_id).to_string(),
        running: true,
        cpu_percent: round2(cpu_percent.clamp(0.0, 100.0)),
        memory_percent: round2(memory_percent.clamp(0.0, 100.0)),
        memory_usage_bytes: memory_usage,
        memory_limit_bytes: memory_limit,
        memory_usage: format_bytes(memory_usage),
        memory_limit: format_bytes(memory_limit),
        network_rx_bytes: network_rx,
        network_tx_bytes: network_tx,
        network_rx: format_bytes(network_rx),
        network_tx: format_bytes(network_tx),
        timestamp: Utc::now(),
        error: None,
    }
}

/// Samples one container at a time; failures come back inline on the returned metrics.
pub struct Sampler {
    inspector: Arc<dyn RuntimeInspector>,
    cache: Arc<dyn MetricsCache>,
    call_timeout: Duration,
}

impl Sampler {
    pub fn new(
        inspector: Arc<dyn RuntimeInspector>,
        cache: Arc<dyn MetricsCache>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            inspector,
            cache,
            call_timeout,
        }
    }

    /// Successful samples are written to the cache; failed ones leave it untouched.
    pub async fn sample(&self, id: &str) -> ContainerMetrics {
        let key = short_id(id);

        match self.bounded("inspect_container", self.inspector.is_running(id)).await {
            Ok(true) => {}
            Ok(false) => return ContainerMetrics::failed(key, NOT_RUNNING),
            Err(e) => {
                tracing::warn!(container_id = key, error = %e, operation = "inspect_container", "sample failed");
                return ContainerMetrics::failed(key, e.to_string());
            }
        }

        let pair = match self.bounded("container_stats", self.inspector.stats(id)).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(container_id = key, error = %e, operation = "container_stats", "sample failed");
                return ContainerMetrics::failed(key, e.to_string());
            }
        };

        let metrics = compute_metrics(id, &pair);
        self.cache.put(key, metrics.clone());
        metrics
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, RuntimeError>>,
    ) -> Result<T, RuntimeError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| RuntimeError::Timeout {
                operation,
                after: self.call_timeout,
            })?
    }
}
