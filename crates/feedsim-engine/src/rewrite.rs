//! Live-looking timestamps on emitted records.
//!
//! Rewriting always works on a copy: the shared log is read concurrently
//! by every subscriber stream and is never touched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::event::{EventRecord, KIND_CONTEST};

/// Format a timestamp the way CLICS feeds do (RFC 3339, milliseconds).
pub fn format_feed_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Process start time, captured once and substituted as the contest start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartClock(DateTime<Utc>);

impl StartClock {
    /// Capture the current wall-clock time.
    pub fn capture() -> Self {
        Self(Utc::now())
    }

    /// Use a fixed instant.
    pub const fn at(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// The captured instant.
    pub const fn time(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces per-emission copies of records with rewritten timestamps.
#[derive(Debug, Clone)]
pub struct TimestampRewriter {
    start: StartClock,
    start_time: String,
}

impl TimestampRewriter {
    /// Create a rewriter substituting `start` as the contest start time.
    pub fn new(start: StartClock) -> Self {
        Self {
            start,
            start_time: format_feed_time(start.time()),
        }
    }

    /// The start clock every contest event is stamped with.
    pub const fn start_clock(&self) -> StartClock {
        self.start
    }

    /// Rewrite `record` for emission now.
    pub fn rewrite(&self, record: &EventRecord) -> EventRecord {
        self.rewrite_at(record, Utc::now())
    }

    /// Rewrite `record` as if emitted at `now`.
    ///
    /// `contest` records get `data.start_time` set to the start clock;
    /// any record with a `data.time` field gets it set to `now`.
    pub fn rewrite_at(&self, record: &EventRecord, now: DateTime<Utc>) -> EventRecord {
        let mut copy = record.clone();

        if copy.kind == KIND_CONTEST {
            copy.data
                .get_or_insert_with(Map::new)
                .insert("start_time".to_owned(), Value::String(self.start_time.clone()));
        }

        if let Some(time) = copy.data.as_mut().and_then(|data| data.get_mut("time")) {
            *time = Value::String(format_feed_time(now));
        }

        copy
    }
}
