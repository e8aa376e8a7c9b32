//! Axum router construction for the feed simulator.
//!
//! Assembles the feed streams, control endpoints and operator page into a
//! single [`Router`] with CORS enabled for browser-based clients.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::feed;
use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- operator page
/// - `GET /event-feed` -- NDJSON event feed
/// - `GET /ws/event-feed` -- `WebSocket` event feed
/// - `POST /api/control/advance` -- release one record
/// - `POST /api/control/next-submission` -- release through next submission
/// - `POST /api/control/next-accepted` -- release through next accepted judgement
/// - `GET /api/control/status` -- replay progress
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        // Feeds
        .route("/event-feed", get(feed::event_feed))
        .route("/ws/event-feed", get(ws::ws_event_feed))
        // Control
        .route("/api/control/advance", post(operator::advance))
        .route("/api/control/next-submission", post(operator::next_submission))
        .route("/api/control/next-accepted", post(operator::next_accepted))
        .route("/api/control/status", get(operator::status))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
