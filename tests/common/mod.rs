// Shared test helpers: a scripted in-memory RuntimeInspector
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use fleetstats::aggregator::{AggregationEngine, EngineSettings};
use fleetstats::cache::MetricsCache;
use fleetstats::error::RuntimeError;
use fleetstats::inspector::RuntimeInspector;
use fleetstats::models::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PLATFORM_LABEL: &str = "deployed_by=student";
pub const OWNER_LABEL_KEY: &str = "user_id";

/// 64-char id whose short form is `name` padded with '_' to 12 chars.
pub fn full_id(name: &str) -> String {
    format!("{:_<12}{}", name, "0".repeat(52))
}

pub fn short(name: &str) -> String {
    format!("{:_<12}", name)
}

/// Counters that sample to exactly `cpu`% CPU (one core) and `memory`% memory.
pub fn counters(cpu: f64, memory: f64) -> CounterPair {
    CounterPair {
        current: CounterSnapshot {
            cpu_total_usage_nanos: 1_000_000 + (cpu * 100.0) as u64,
            system_cpu_usage_nanos: 20_000,
            online_cpu_count: 1,
            memory_usage_bytes: (memory * 100.0) as u64,
            memory_limit_bytes: 10_000,
            network_interfaces: Default::default(),
        },
        previous: CounterSnapshot {
            cpu_total_usage_nanos: 1_000_000,
            system_cpu_usage_nanos: 10_000,
            online_cpu_count: 1,
            ..Default::default()
        },
    }
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub descriptor: ContainerDescriptor,
    /// What inspect reports; may differ from the listed status to simulate a race.
    pub running: bool,
    pub stats: Result<CounterPair, String>,
    pub delay: Duration,
    pub logs: String,
}

impl FakeContainer {
    fn with_state(name: &str, state: ContainerState, running: bool) -> Self {
        let mut labels = HashMap::new();
        labels.insert("deployed_by".to_string(), "student".to_string());
        Self {
            descriptor: ContainerDescriptor {
                id: short(name),
                full_id: full_id(name),
                name: name.to_string(),
                image: "nginx:latest".to_string(),
                status: state,
                state_text: format!("{:?}", state),
                created_at: Utc::now(),
                ports: vec![],
                labels,
            },
            running,
            stats: Ok(counters(0.0, 0.0)),
            delay: Duration::ZERO,
            logs: format!("{} log line\n", name),
        }
    }

    pub fn running(name: &str, cpu: f64, memory: f64) -> Self {
        Self {
            stats: Ok(counters(cpu, memory)),
            ..Self::with_state(name, ContainerState::Running, true)
        }
    }

    pub fn stopped(name: &str) -> Self {
        Self::with_state(name, ContainerState::Exited, false)
    }

    /// Listed and inspected as running, but its stats call fails.
    pub fn broken(name: &str, error: &str) -> Self {
        Self {
            stats: Err(error.to_string()),
            ..Self::with_state(name, ContainerState::Running, true)
        }
    }

    pub fn owned_by(mut self, owner: &str) -> Self {
        self.descriptor
            .labels
            .insert(OWNER_LABEL_KEY.to_string(), owner.to_string());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct FakeInspector {
    containers: Mutex<Vec<FakeContainer>>,
    list_error: Mutex<Option<String>>,
    info: Mutex<Option<RuntimeInfo>>,
    pub list_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub last_labels: Mutex<Vec<String>>,
    pub last_tail: Mutex<Option<usize>>,
}

impl FakeInspector {
    pub fn new(containers: Vec<FakeContainer>) -> Arc<Self> {
        Arc::new(Self {
            containers: Mutex::new(containers),
            ..Default::default()
        })
    }

    pub fn fail_listing(&self, error: &str) {
        *self.list_error.lock().unwrap() = Some(error.to_string());
    }

    pub fn set_info(&self, info: RuntimeInfo) {
        *self.info.lock().unwrap() = Some(info);
    }

    pub fn set_stats(&self, name: &str, stats: Result<CounterPair, String>) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.iter_mut().find(|c| c.descriptor.name == name) {
            c.stats = stats;
        }
    }

    pub fn set_running(&self, name: &str, running: bool) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.iter_mut().find(|c| c.descriptor.name == name) {
            c.running = running;
        }
    }

    pub fn remove(&self, name: &str) {
        self.containers
            .lock()
            .unwrap()
            .retain(|c| c.descriptor.name != name);
    }

    fn find(&self, id: &str) -> Result<FakeContainer, RuntimeError> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.descriptor.full_id.starts_with(id) && !id.is_empty())
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl RuntimeInspector for FakeInspector {
    async fn list_containers(
        &self,
        labels: &[String],
    ) -> Result<Vec<ContainerDescriptor>, RuntimeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_labels.lock().unwrap() = labels.to_vec();
        if let Some(e) = self.list_error.lock().unwrap().clone() {
            return Err(RuntimeError::MalformedStats(e));
        }
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .filter(|c| {
                labels.iter().all(|l| {
                    let (k, v) = l.split_once('=').unwrap_or((l.as_str(), ""));
                    c.descriptor.labels.get(k).map(String::as_str) == Some(v)
                })
            })
            .map(|c| c.descriptor.clone())
            .collect())
    }

    async fn is_running(&self, id: &str) -> Result<bool, RuntimeError> {
        let c = self.find(id)?;
        if !c.delay.is_zero() {
            tokio::time::sleep(c.delay).await;
        }
        Ok(c.running)
    }

    async fn stats(&self, id: &str) -> Result<CounterPair, RuntimeError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let c = self.find(id)?;
        if !c.delay.is_zero() {
            tokio::time::sleep(c.delay).await;
        }
        c.stats.map_err(RuntimeError::MalformedStats)
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<String, RuntimeError> {
        *self.last_tail.lock().unwrap() = Some(tail);
        Ok(self.find(id)?.logs)
    }

    async fn info(&self) -> Result<RuntimeInfo, RuntimeError> {
        self.info
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RuntimeError::MalformedStats("Cannot connect to the Docker daemon".into()))
    }
}

pub fn settings(sample_timeout: Duration) -> EngineSettings {
    EngineSettings {
        platform_label: PLATFORM_LABEL.to_string(),
        owner_label_key: OWNER_LABEL_KEY.to_string(),
        sample_timeout,
    }
}

pub fn engine(inspector: Arc<FakeInspector>, cache: Arc<dyn MetricsCache>) -> AggregationEngine {
    AggregationEngine::new(inspector, cache, settings(Duration::from_secs(5)))
}
