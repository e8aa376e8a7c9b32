//! `WebSocket` variant of the event feed.
//!
//! Clients connect to `GET /ws/event-feed` and receive one JSON text
//! frame per released record, with the same replay-from-start semantics
//! as the NDJSON feed.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming released records.
///
/// # Route
///
/// `GET /ws/event-feed`
pub async fn ws_event_feed(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: open a subscriber stream and forward
/// each released record as a text frame until the client goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut stream = state.open_stream();
    info!(
        subscriber = %stream.id(),
        active = state.subscriber_count(),
        "websocket feed subscriber connected"
    );

    loop {
        tokio::select! {
            batch = stream.next_batch() => {
                for emission in batch {
                    let json = match serde_json::to_string(&emission.record) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!(index = emission.index, "failed to serialize record: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        debug!(subscriber = %stream.id(), "websocket client disconnected (send failed)");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = %stream.id(), "websocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(subscriber = %stream.id(), "websocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(subscriber = %stream.id(), "websocket error: {e}");
                        return;
                    }
                    _ => {
                        // Ignore other frames from the client.
                    }
                }
            }
        }
    }
}
