use axum::{
    extract::State,
    response::{sse::Event, Json, Sse},
};
use printboard_core::engine::lock_engine;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::state::ServerState;

const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// SSE endpoint: streams BoardChangeEvent as JSON to connected clients.
/// Lagging clients silently skip the events they missed and should refetch
/// `/state` when the revision jumps.
pub async fn sse_events(
    State(state): State<ServerState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = lock_engine(&state.engine).subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let event = result.ok()?;
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event("board").data(json)))
    });

    let keep_alive = IntervalStream::new(tokio::time::interval(KEEP_ALIVE))
        .map(|_| Ok(Event::default().comment("keep-alive")));

    Sse::new(stream.merge(keep_alive))
}

pub async fn status(State(state): State<ServerState>) -> Json<serde_json::Value> {
    let engine = lock_engine(&state.engine);
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
        "bindAddress": state.bind_address,
        "revision": engine.revision(),
        "cards": engine.state().tabs.total_cards(),
        "autoSync": state
            .auto_sync
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false),
    }))
}

pub async fn list_logs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(),
        "filePath": crate::log_bridge::log_file_path(),
    }))
}

pub async fn stream_logs() -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = crate::log_bridge::subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|item| {
        let entry = item.ok()?;
        let payload = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(payload)))
    });
    Sse::new(stream)
}
