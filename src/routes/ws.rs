// WebSocket live metrics stream

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::time::{Duration, timeout};

use super::{AppState, OwnerQuery};
use crate::publisher::Subscription;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_metrics(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> impl IntoResponse {
    let publisher = state.publisher.clone();
    let owner = query.owner().map(str::to_string);
    ws.on_upgrade(move |socket| async move {
        let subscription = publisher.subscribe(owner);
        if let Err(e) = stream_metrics(socket, subscription).await {
            tracing::info!("Metrics stream error: {}", e);
        }
    })
}

/// Forwards every published snapshot until the client closes, a send fails, or the subscription ends.
/// The subscription is dropped (and its timer cancelled) on every return path.
async fn stream_metrics(mut socket: WebSocket, mut subscription: Subscription) -> anyhow::Result<()> {
    tracing::info!("Client connected to metrics stream");

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first ping tick fires immediately.
    ping_interval.tick().await;
    loop {
        tokio::select! {
            next = subscription.recv() => {
                let Some(snapshot) = next else { break };
                let json = serde_json::to_string(&snapshot)?;
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!("Client left metrics stream");
    Ok(())
}
