//! Newline-delimited JSON event feed.
//!
//! Clients connect to `GET /event-feed` and receive every released record
//! from the start of the log, one JSON object per line, followed by new
//! records as the operator releases them. The response never completes;
//! when the client disconnects the body is dropped, which drops the
//! subscriber's stream and deregisters its wake signal.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use feedsim_engine::EventRecord;
use futures::StreamExt;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Content type of the feed body.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Open a feed subscription and stream it as NDJSON.
///
/// # Route
///
/// `GET /event-feed`
pub async fn event_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stream = state.open_stream();
    info!(
        subscriber = %stream.id(),
        active = state.subscriber_count(),
        boundary = state.cursor.boundary(),
        "event feed subscriber connected"
    );

    let body = stream
        .into_stream()
        .map(|emission| encode_line(&emission.record));

    ([(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)], Body::from_stream(body))
}

/// Serialize one record as a single `\n`-terminated line.
///
/// # Errors
///
/// Returns [`ApiError::Serialization`] if the record cannot be encoded.
pub fn encode_line(record: &EventRecord) -> Result<Bytes, ApiError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}
