// Docker runtime access via bollard

mod stats;

use crate::error::RuntimeError;
use crate::inspector::RuntimeInspector;
use crate::models::{
    ContainerDescriptor, ContainerState, CounterPair, PortMapping, RuntimeInfo, short_id,
};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, StatsOptions,
};
use bollard::models::ContainerSummary;
use chrono::DateTime;
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// Connects over the local unix socket, falling back to `DOCKER_HOST` style defaults.
    /// No request is made here; an unreachable daemon surfaces on the first call.
    pub fn connect() -> anyhow::Result<Self> {
        let docker = match Docker::connect_with_unix_defaults() {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "unix socket client unavailable, trying environment defaults");
                Docker::connect_with_defaults()?
            }
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl RuntimeInspector for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(
        &self,
        labels: &[String],
    ) -> Result<Vec<ContainerDescriptor>, RuntimeError> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), labels.to_vec());

        let options = ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.iter().filter_map(descriptor_from_summary).collect())
    }

    async fn is_running(&self, id: &str) -> Result<bool, RuntimeError> {
        let inspection = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        Ok(inspection
            .state
            .as_ref()
            .and_then(|s| s.running)
            .unwrap_or(false))
    }

    async fn stats(&self, id: &str) -> Result<CounterPair, RuntimeError> {
        // Non-streaming stats wait for a second reading so `precpu_stats` is populated.
        let options = StatsOptions {
            stream: false,
            one_shot: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(result) => stats::counter_pair(&result?),
            None => Err(RuntimeError::MalformedStats(format!(
                "empty stats response for {}",
                short_id(id)
            ))),
        }
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<String, RuntimeError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&String::from_utf8_lossy(&chunk?.into_bytes()));
        }
        Ok(out)
    }

    async fn info(&self) -> Result<RuntimeInfo, RuntimeError> {
        self.docker.ping().await?;
        let info = self.docker.info().await?;
        Ok(RuntimeInfo {
            containers: info.containers.unwrap_or(0),
            containers_running: info.containers_running.unwrap_or(0),
            containers_paused: info.containers_paused.unwrap_or(0),
            containers_stopped: info.containers_stopped.unwrap_or(0),
            images: info.images.unwrap_or(0),
            server_version: info.server_version.unwrap_or_default(),
        })
    }
}

/// Maps one list entry to a descriptor. Entries without an id are skipped.
pub(crate) fn descriptor_from_summary(c: &ContainerSummary) -> Option<ContainerDescriptor> {
    let full_id = c.id.clone().filter(|id| !id.is_empty())?;
    let id = short_id(&full_id).to_string();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let state = c.state.as_ref().map(|s| s.to_string()).unwrap_or_default();
    let created_at = c
        .created
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default();
    let ports = c
        .ports
        .as_ref()
        .map(|ports| {
            ports
                .iter()
                .map(|p| PortMapping {
                    private_port: p.private_port,
                    public_port: p.public_port,
                    transport: p
                        .typ
                        .as_ref()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "tcp".to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ContainerDescriptor {
        id,
        full_id,
        name,
        image: c.image.clone().unwrap_or_else(|| "unknown".to_string()),
        status: ContainerState::from_docker(&state),
        state_text: c.status.clone().unwrap_or_default(),
        created_at,
        ports,
        labels: c.labels.clone().unwrap_or_default(),
    })
}
