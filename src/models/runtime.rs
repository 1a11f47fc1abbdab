// Container runtime health

use serde::{Deserialize, Serialize};

/// Daemon-wide counts reported by the runtime's info call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub containers: i64,
    pub containers_running: i64,
    pub containers_paused: i64,
    pub containers_stopped: i64,
    pub images: i64,
    pub server_version: String,
}

/// Result of the dedicated health check: either the runtime's info or why it is unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    pub running: bool,
    #[serde(flatten)]
    pub info: Option<RuntimeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuntimeStatus {
    pub fn up(info: RuntimeInfo) -> Self {
        Self {
            running: true,
            info: Some(info),
            error: None,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            running: false,
            info: None,
            error: Some(error.into()),
        }
    }
}
