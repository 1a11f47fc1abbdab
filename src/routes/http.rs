// GET handlers: version, runtime status, fleet and single-container metrics, logs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{AppState, OwnerQuery};
use crate::inspector::check_runtime;

/// Package version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Package name (from Cargo.toml).
const NAME: &str = env!("CARGO_PKG_NAME");

/// `{ success, data }` on success, `{ success: false, message }` on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::fail(message))).into_response()
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/metrics/status: runtime health, reported inline even when the runtime is down.
pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let status = check_runtime(state.inspector.as_ref()).await;
    Json(ApiResponse::ok(status))
}

/// GET /api/metrics/containers?userId=: one aggregation pass.
pub(super) async fn containers_handler(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> impl IntoResponse {
    let snapshot = state.engine.aggregate(query.owner()).await;
    Json(ApiResponse::ok(snapshot))
}

/// GET /api/metrics/container/{id}: 404 when the container is not running and sampling reported an error.
pub(super) async fn container_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let metrics = state.engine.sample_one(&id).await;
    if !metrics.running
        && let Some(error) = &metrics.error
    {
        return failure(StatusCode::NOT_FOUND, error.clone());
    }
    Json(ApiResponse::ok(metrics)).into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    tail: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerLogs {
    logs: String,
    container_id: String,
}

/// GET /api/metrics/container/{id}/logs?tail=: unparseable or zero `tail` falls back to the configured default.
pub(super) async fn logs_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let tail = query
        .tail
        .as_deref()
        .and_then(|t| t.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(state.config.runtime.default_log_tail);

    match state.inspector.logs(&id, tail).await {
        Ok(logs) => Json(ApiResponse::ok(ContainerLogs {
            logs,
            container_id: id,
        }))
        .into_response(),
        Err(e) if e.is_not_found() => failure(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => {
            tracing::warn!(container_id = %id, error = %e, operation = "container_logs", "log query failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
