// Raw counters and derived per-container metrics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::format::format_bytes;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Cumulative counters for one container at one instant.
///
/// Counters only grow while the container lives; a restart resets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub cpu_total_usage_nanos: u64,
    pub system_cpu_usage_nanos: u64,
    pub online_cpu_count: u32,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    #[serde(default)]
    pub network_interfaces: BTreeMap<String, InterfaceCounters>,
}

impl Default for CounterSnapshot {
    fn default() -> Self {
        Self {
            cpu_total_usage_nanos: 0,
            system_cpu_usage_nanos: 0,
            online_cpu_count: 1,
            memory_usage_bytes: 0,
            memory_limit_bytes: 0,
            network_interfaces: BTreeMap::new(),
        }
    }
}

/// Current and previous readings as returned by one runtime stats call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterPair {
    pub current: CounterSnapshot,
    pub previous: CounterSnapshot,
}

/// Derived utilization for one container. `error` is set only when sampling failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetrics {
    pub container_id: String,
    pub running: bool,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_usage: String,
    pub memory_limit: String,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
    pub network_rx: String,
    pub network_tx: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContainerMetrics {
    /// Zeroed metrics for a container that is simply not running.
    pub fn stopped(container_id: impl Into<String>) -> Self {
        let zero = format_bytes(0);
        Self {
            container_id: container_id.into(),
            running: false,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            memory_usage_bytes: 0,
            memory_limit_bytes: 0,
            memory_usage: zero.clone(),
            memory_limit: zero.clone(),
            network_rx_bytes: 0,
            network_tx_bytes: 0,
            network_rx: zero.clone(),
            network_tx: zero,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Zeroed metrics carrying the reason sampling failed.
    pub fn failed(container_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::stopped(container_id)
        }
    }

    /// Running, error-free metrics; the only ones that count towards fleet averages.
    pub fn is_valid(&self) -> bool {
        self.running && self.error.is_none()
    }
}
