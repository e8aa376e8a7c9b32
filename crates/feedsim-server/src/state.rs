//! Shared application state for the feed simulator server.
//!
//! [`AppState`] owns the release cursor (and through it the log and the
//! broadcaster) plus the timestamp rewriter. Control handlers mutate the
//! cursor; every feed connection opens its own [`EventStream`].

use std::sync::Arc;

use feedsim_engine::rewrite::format_feed_time;
use feedsim_engine::{
    EventLog, EventStream, ReleaseCursor, StartClock, SubscriptionBroadcaster, TimestampRewriter,
};
use serde::Serialize;

/// Snapshot of the replay progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStatus {
    /// Number of released records.
    pub boundary: usize,
    /// Number of records in the log.
    pub total_events: usize,
    /// Records not yet released.
    pub remaining_events: usize,
    /// Connected feed subscribers.
    pub subscribers: usize,
    /// Contest start time substituted into `contest` events.
    pub started_at: String,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The single shared release cursor.
    pub cursor: Arc<ReleaseCursor>,
    /// Rewriter applied to every emitted record.
    pub rewriter: Arc<TimestampRewriter>,
}

impl AppState {
    /// Build the state for `log`, positioning the cursor at the first
    /// submission.
    pub fn new(log: EventLog, start: StartClock) -> Self {
        let cursor = ReleaseCursor::new(Arc::new(log), Arc::new(SubscriptionBroadcaster::new()));
        Self {
            cursor: Arc::new(cursor),
            rewriter: Arc::new(TimestampRewriter::new(start)),
        }
    }

    /// Register a new subscriber and return its stream.
    pub fn open_stream(&self) -> EventStream {
        EventStream::open(Arc::clone(&self.cursor), Arc::clone(&self.rewriter))
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.cursor.broadcaster().len()
    }

    /// Current replay progress.
    pub fn status(&self) -> FeedStatus {
        let boundary = self.cursor.boundary();
        let total_events = self.cursor.log().len();
        FeedStatus {
            boundary,
            total_events,
            remaining_events: total_events.saturating_sub(boundary),
            subscribers: self.subscriber_count(),
            started_at: format_feed_time(self.rewriter.start_clock().time()),
        }
    }
}
