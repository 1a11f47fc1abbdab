// HTTP, WebSocket and SSE routes

mod http;
mod sse;
mod ws;

use axum::{Router, routing::get};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::AggregationEngine;
use crate::config::AppConfig;
use crate::inspector::RuntimeInspector;
use crate::publisher::LivePublisher;

pub use http::ApiResponse;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: Arc<AggregationEngine>,
    pub(crate) publisher: Arc<LivePublisher>,
    pub(crate) inspector: Arc<dyn RuntimeInspector>,
    pub(crate) config: AppConfig,
}

/// `?userId=` narrowing a fleet query to one owner.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OwnerQuery {
    pub(crate) user_id: Option<String>,
}

impl OwnerQuery {
    pub(crate) fn owner(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.is_empty())
    }
}

pub fn app(
    engine: Arc<AggregationEngine>,
    publisher: Arc<LivePublisher>,
    inspector: Arc<dyn RuntimeInspector>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        engine,
        publisher,
        inspector,
        config,
    };
    Router::new()
        .route("/", get(|| async { "fleetstats: container metrics service" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metrics/status", get(http::status_handler)) // GET /api/metrics/status
        .route("/api/metrics/containers", get(http::containers_handler)) // GET /api/metrics/containers?userId=
        .route("/api/metrics/container/{id}", get(http::container_handler)) // GET /api/metrics/container/:id
        .route("/api/metrics/container/{id}/logs", get(http::logs_handler)) // GET /api/metrics/container/:id/logs?tail=
        .route("/api/metrics/live", get(sse::live_handler)) // SSE /api/metrics/live?userId=
        .route("/ws/metrics", get(ws::ws_metrics)) // WS /ws/metrics?userId=
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
