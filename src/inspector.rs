// Boundary with the container runtime

use async_trait::async_trait;

use crate::error::RuntimeError;
use crate::models::{ContainerDescriptor, CounterPair, RuntimeInfo, RuntimeStatus};

/// Read-only view of a container runtime. Every method is a potential blocking call.
#[async_trait]
pub trait RuntimeInspector: Send + Sync {
    /// All containers (running or not) carrying every `key=value` label in `labels`.
    async fn list_containers(
        &self,
        labels: &[String],
    ) -> Result<Vec<ContainerDescriptor>, RuntimeError>;

    /// Whether the container is currently running.
    async fn is_running(&self, id: &str) -> Result<bool, RuntimeError>;

    /// One stats reading carrying both the current and the previous counters.
    async fn stats(&self, id: &str) -> Result<CounterPair, RuntimeError>;

    /// Last `tail` lines of combined stdout/stderr.
    async fn logs(&self, id: &str, tail: usize) -> Result<String, RuntimeError>;

    async fn info(&self) -> Result<RuntimeInfo, RuntimeError>;
}

/// Health check for the runtime itself, kept apart from the aggregation path.
pub async fn check_runtime(inspector: &dyn RuntimeInspector) -> RuntimeStatus {
    match inspector.info().await {
        Ok(info) => RuntimeStatus::up(info),
        Err(e) => {
            tracing::warn!(error = %e, operation = "check_runtime", "container runtime unreachable");
            RuntimeStatus::down(e.to_string())
        }
    }
}
