// Server-Sent Events live metrics stream

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;

use super::{AppState, OwnerQuery};
use crate::models::AggregatedSnapshot;

/// GET /api/metrics/live?userId=: one `data:` event per tick. Axum drops the
/// stream when the client disconnects, which drops the subscription with it.
pub(super) async fn live_handler(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.publisher.subscribe(query.owner().map(str::to_string));
    tracing::info!("Client connected to live SSE stream");

    let events = stream::unfold(subscription, |mut subscription| async move {
        let snapshot = subscription.recv().await?;
        Some((Ok(snapshot_event(&snapshot)), subscription))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

pub(super) fn snapshot_event(snapshot: &AggregatedSnapshot) -> Event {
    Event::default().json_data(snapshot).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "snapshot serialization failed");
        Event::default().event("error").data(e.to_string())
    })
}
