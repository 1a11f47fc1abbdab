// Fleet-wide snapshot for one aggregation pass

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerDescriptor, ContainerMetrics};

/// One listed container with the metrics computed for it in this pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEntry {
    #[serde(flatten)]
    pub container: ContainerDescriptor,
    pub metrics: ContainerMetrics,
    /// Last successful sample, attached only when this pass failed to sample the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known: Option<ContainerMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSnapshot {
    pub average_cpu_percent: f64,
    pub average_memory_percent: f64,
    pub total_containers: usize,
    pub running_containers: usize,
    pub stopped_containers: usize,
    pub containers: Vec<ContainerEntry>,
    pub generated_at: DateTime<Utc>,
}

impl AggregatedSnapshot {
    /// Snapshot of a fleet with no containers. A valid state, not an error.
    pub fn empty() -> Self {
        Self {
            average_cpu_percent: 0.0,
            average_memory_percent: 0.0,
            total_containers: 0,
            running_containers: 0,
            stopped_containers: 0,
            containers: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}
