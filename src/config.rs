use serde::Deserialize;
use std::time::Duration;

use crate::aggregator::EngineSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub runtime: RuntimeConfig,
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Label every platform-deployed container carries, as `key=value`.
    pub platform_label: String,
    /// Label key holding the owning user's id.
    pub owner_label_key: String,
    /// Upper bound on each runtime call made while sampling one container.
    pub sample_timeout_ms: u64,
    #[serde(default = "default_log_tail")]
    pub default_log_tail: usize,
}

fn default_log_tail() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    pub live_interval_ms: u64,
    /// Snapshots queued per live subscriber before the tick task waits on a slow client.
    pub subscriber_buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Consecutive unfiltered passes a container may be missing before its cached metrics are dropped.
    #[serde(default = "default_evict_after_cycles")]
    pub evict_after_cycles: u32,
    /// Entries not refreshed for this long are dropped, whatever the listings say.
    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,
}

fn default_evict_after_cycles() -> u32 {
    5
}

fn default_max_idle_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            evict_after_cycles: default_evict_after_cycles(),
            max_idle_secs: default_max_idle_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (live subscribers, cached containers) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            platform_label: self.runtime.platform_label.clone(),
            owner_label_key: self.runtime.owner_label_key.clone(),
            sample_timeout: Duration::from_millis(self.runtime.sample_timeout_ms),
        }
    }

    pub fn cache_max_idle(&self) -> Duration {
        Duration::from_secs(self.cache.max_idle_secs)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.publishing.live_interval_ms)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.runtime
                .platform_label
                .split_once('=')
                .is_some_and(|(k, _)| !k.is_empty()),
            "runtime.platform_label must look like key=value, got {:?}",
            self.runtime.platform_label
        );
        anyhow::ensure!(
            !self.runtime.owner_label_key.is_empty() && !self.runtime.owner_label_key.contains('='),
            "runtime.owner_label_key must be a non-empty label key, got {:?}",
            self.runtime.owner_label_key
        );
        anyhow::ensure!(
            self.runtime.sample_timeout_ms > 0,
            "runtime.sample_timeout_ms must be > 0, got {}",
            self.runtime.sample_timeout_ms
        );
        anyhow::ensure!(
            self.runtime.default_log_tail > 0,
            "runtime.default_log_tail must be > 0, got {}",
            self.runtime.default_log_tail
        );
        anyhow::ensure!(
            self.publishing.live_interval_ms > 0,
            "publishing.live_interval_ms must be > 0, got {}",
            self.publishing.live_interval_ms
        );
        anyhow::ensure!(
            self.publishing.subscriber_buffer > 0,
            "publishing.subscriber_buffer must be > 0, got {}",
            self.publishing.subscriber_buffer
        );
        anyhow::ensure!(
            self.cache.evict_after_cycles > 0,
            "cache.evict_after_cycles must be > 0, got {}",
            self.cache.evict_after_cycles
        );
        anyhow::ensure!(
            self.cache.max_idle_secs > 0,
            "cache.max_idle_secs must be > 0, got {}",
            self.cache.max_idle_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
