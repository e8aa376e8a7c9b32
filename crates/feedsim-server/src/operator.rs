//! Operator control endpoints.
//!
//! Each control request moves the shared release cursor and wakes every
//! connected subscriber once. Running off the end of the log is not an
//! error: the acknowledgement reports `exhausted: true`.
//!
//! Requests whose `Accept` header asks for HTML (the operator page's
//! forms) get a `303 See Other` back to `/` instead of the JSON body.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/control/advance` | Release one more record |
//! | `POST` | `/api/control/next-submission` | Release through the next submission |
//! | `POST` | `/api/control/next-accepted` | Release through the next accepted judgement |
//! | `GET` | `/api/control/status` | Current replay progress |

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use feedsim_engine::{Movement, SeekExhausted, SeekTarget};
use serde::Serialize;

use crate::state::{AppState, FeedStatus};

/// Acknowledgement returned by every control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlAck {
    /// Always `true`; control operations cannot fail.
    pub ok: bool,
    /// Name of the operation applied.
    pub operation: &'static str,
    /// Boundary before the operation.
    pub previous_boundary: usize,
    /// Boundary after the operation.
    pub boundary: usize,
    /// Whether a seek ran off the end of the log.
    pub exhausted: bool,
}

impl ControlAck {
    const fn moved(operation: &'static str, movement: Movement) -> Self {
        Self {
            ok: true,
            operation,
            previous_boundary: movement.previous,
            boundary: movement.boundary,
            exhausted: false,
        }
    }

    const fn exhausted(operation: &'static str, err: SeekExhausted) -> Self {
        Self {
            ok: true,
            operation,
            previous_boundary: err.previous,
            boundary: err.boundary,
            exhausted: true,
        }
    }

    fn from_seek(target: SeekTarget, result: Result<Movement, SeekExhausted>) -> Self {
        match result {
            Ok(movement) => Self::moved(target.as_str(), movement),
            Err(err) => Self::exhausted(target.as_str(), err),
        }
    }
}

/// Answer a control request: JSON for API clients, a redirect to the
/// operator page for browsers.
fn acknowledge(headers: &HeaderMap, ack: ControlAck) -> Response {
    if prefers_html(headers) {
        Redirect::to("/").into_response()
    } else {
        Json(ack).into_response()
    }
}

/// Whether the `Accept` header lists `text/html` before any JSON type.
fn prefers_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    accept
        .split(',')
        .map(|item| item.split(';').next().unwrap_or_default().trim())
        .find(|media| *media == "text/html" || *media == "application/json")
        .is_some_and(|media| media == "text/html")
}

/// Release the next record.
pub async fn advance(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    acknowledge(&headers, ControlAck::moved("advance", state.cursor.advance()))
}

/// Release everything up to and including the next submission.
pub async fn next_submission(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = state.cursor.skip_to_next_submission();
    acknowledge(&headers, ControlAck::from_seek(SeekTarget::Submission, result))
}

/// Release everything up to and including the next accepted judgement.
pub async fn next_accepted(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = state.cursor.skip_to_next_accepted_judgement();
    acknowledge(&headers, ControlAck::from_seek(SeekTarget::AcceptedJudgement, result))
}

/// Report the current boundary, log size and subscriber count.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<FeedStatus> {
    Json(state.status())
}
