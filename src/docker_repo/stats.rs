// Convert a raw Docker stats response into current/previous counter snapshots.

use crate::error::RuntimeError;
use crate::models::{CounterPair, CounterSnapshot, InterfaceCounters};
use bollard::models::{ContainerCpuStats, ContainerStatsResponse};
use std::collections::BTreeMap;

/// Splits one non-streaming stats response into `cpu_stats` (current) and
/// `precpu_stats` (previous). Memory and network are only reported for the current reading.
pub(crate) fn counter_pair(s: &ContainerStatsResponse) -> Result<CounterPair, RuntimeError> {
    let cpu_stats = s
        .cpu_stats
        .as_ref()
        .ok_or_else(|| RuntimeError::MalformedStats("missing cpu_stats".into()))?;
    let total_usage = cpu_stats
        .cpu_usage
        .as_ref()
        .and_then(|u| u.total_usage)
        .ok_or_else(|| RuntimeError::MalformedStats("missing cpu_stats.cpu_usage".into()))?;

    let memory_usage_bytes = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let memory_limit_bytes = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);

    let network_interfaces: BTreeMap<String, InterfaceCounters> = s
        .networks
        .as_ref()
        .map(|n| {
            n.iter()
                .map(|(name, v)| {
                    (
                        name.clone(),
                        InterfaceCounters {
                            rx_bytes: v.rx_bytes.unwrap_or(0),
                            tx_bytes: v.tx_bytes.unwrap_or(0),
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let current = CounterSnapshot {
        cpu_total_usage_nanos: total_usage,
        system_cpu_usage_nanos: cpu_stats.system_cpu_usage.unwrap_or(0),
        online_cpu_count: online_cpus(cpu_stats),
        memory_usage_bytes,
        memory_limit_bytes,
        network_interfaces,
    };

    // The first reading after container start has no previous sample.
    let previous = s
        .precpu_stats
        .as_ref()
        .map(|p| CounterSnapshot {
            cpu_total_usage_nanos: p.cpu_usage.as_ref().and_then(|u| u.total_usage).unwrap_or(0),
            system_cpu_usage_nanos: p.system_cpu_usage.unwrap_or(0),
            online_cpu_count: online_cpus(p),
            ..Default::default()
        })
        .unwrap_or_default();

    Ok(CounterPair { current, previous })
}

fn online_cpus(stats: &ContainerCpuStats) -> u32 {
    match stats.online_cpus {
        Some(n) if n > 0 => n,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats, ContainerNetworkStats,
        ContainerStatsResponse,
    };
    use std::collections::HashMap;

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn counter_pair_rejects_missing_cpu_stats() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        let err = counter_pair(&s).unwrap_err();
        assert!(matches!(err, RuntimeError::MalformedStats(_)));
    }

    #[test]
    fn counter_pair_treats_missing_precpu_as_zero() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        let pair = counter_pair(&s).unwrap();
        assert_eq!(pair.previous.cpu_total_usage_nanos, 0);
        assert_eq!(pair.previous.system_cpu_usage_nanos, 0);
        assert_eq!(pair.current.cpu_total_usage_nanos, 100);
    }

    #[test]
    fn counter_pair_extracts_memory_and_networks() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                ..Default::default()
            }),
            networks: Some({
                let mut m = HashMap::new();
                m.insert(
                    "eth0".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(1000),
                        tx_bytes: Some(2000),
                        ..Default::default()
                    },
                );
                m.insert(
                    "eth1".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(5),
                        tx_bytes: None,
                        ..Default::default()
                    },
                );
                m
            }),
            ..Default::default()
        };
        let pair = counter_pair(&s).unwrap();
        assert_eq!(pair.current.online_cpu_count, 2);
        assert_eq!(pair.current.memory_usage_bytes, 256 * 1024 * 1024);
        assert_eq!(pair.current.memory_limit_bytes, 512 * 1024 * 1024);
        assert_eq!(pair.current.network_interfaces.len(), 2);
        assert_eq!(pair.current.network_interfaces["eth1"].tx_bytes, 0);
        assert_eq!(pair.previous.cpu_total_usage_nanos, 50_000_000);
        assert_eq!(pair.previous.system_cpu_usage_nanos, 500_000_000);
    }

    #[test]
    fn counter_pair_defaults_online_cpus_to_one() {
        let mut cpu = minimal_cpu_stats(10, 20);
        cpu.online_cpus = None;
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu),
            ..Default::default()
        };
        assert_eq!(counter_pair(&s).unwrap().current.online_cpu_count, 1);
    }
}
