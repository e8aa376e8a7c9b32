//! Recorded event log.
//!
//! The log is a newline-delimited JSON file in the CLICS event-feed shape:
//! every line is one self-contained record with a `type` key, an optional
//! `data` object, and any number of other top-level keys (`id`, `op`,
//! `token`, ...) that are carried through untouched.
//!
//! The log is loaded once at startup, in file order, and is read-only for
//! the rest of the process lifetime.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// Record kind of the contest description event.
pub const KIND_CONTEST: &str = "contest";

/// Record kind of submission events.
pub const KIND_SUBMISSIONS: &str = "submissions";

/// A single recorded feed event.
///
/// Identified by its position in the [`EventLog`]; never mutated after
/// load. Copies handed to subscribers are produced by
/// [`TimestampRewriter`](crate::rewrite::TimestampRewriter).
///
/// The kind is read from `type`, or from `kind` when `type` is absent.
/// Both keys name the same field, so a record carrying both is rejected
/// as a duplicate rather than keeping `kind` as an extra key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event kind, e.g. `contest`, `teams`, `submissions`.
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,

    /// Event payload. `null` on input is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Every other top-level key, re-emitted verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Build a record with the given kind and no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            extra: Map::new(),
        }
    }

    /// Attach a payload, replacing any existing one.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Look up a payload field.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// Immutable ordered sequence of [`EventRecord`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Wrap an already-decoded sequence of records, keeping their order.
    pub const fn from_records(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    /// Read and decode the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read and
    /// [`LoadError::Malformed`] on the first record that fails to decode.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Decode newline-delimited records from a string.
    ///
    /// Blank lines are skipped but still counted for error line numbers.
    /// Records keep file order; nothing is sorted.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Malformed`] on the first line that is not a
    /// valid record. No partial log is returned.
    pub fn parse(contents: &str) -> Result<Self, LoadError> {
        let records = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<EventRecord>(line).map_err(|source| LoadError::Malformed {
                    line: idx.saturating_add(1),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Number of records in the log.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index)
    }

    /// All records, in log order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records in `[start, end)`, clamped to the log bounds.
    pub fn range(&self, start: usize, end: usize) -> &[EventRecord] {
        let end = end.min(self.records.len());
        self.records.get(start..end).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_file_order() {
        let log = EventLog::parse(
            "{\"type\":\"teams\",\"id\":\"t1\"}\n{\"type\":\"contest\"}\n{\"type\":\"submissions\"}\n",
        )
        .unwrap();
        let kinds: Vec<&str> = log.records().iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["teams", "contest", "submissions"]);
    }

    #[test]
    fn parse_skips_blank_lines() {
        let log = EventLog::parse("\n{\"type\":\"contest\"}\n   \n{\"type\":\"teams\"}").unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn parse_accepts_kind_alias_and_null_data() {
        let log = EventLog::parse("{\"kind\":\"teams\",\"data\":null}").unwrap();
        let record = log.get(0).unwrap();
        assert_eq!(record.kind, "teams");
        assert!(record.data.is_none());
    }

    #[test]
    fn parse_rejects_both_type_and_kind() {
        let err = EventLog::parse("{\"type\":\"teams\",\"kind\":\"x\"}").unwrap_err();
        match err {
            LoadError::Malformed { line, source } => {
                assert_eq!(line, 1);
                assert!(source.to_string().contains("duplicate field"));
            }
            LoadError::Io { .. } => panic!("expected malformed error"),
        }
    }

    #[test]
    fn parse_preserves_extra_fields() {
        let log =
            EventLog::parse("{\"type\":\"submissions\",\"id\":\"42\",\"op\":\"create\",\"data\":{\"id\":\"s1\"}}")
                .unwrap();
        let json = serde_json::to_value(log.get(0).unwrap()).unwrap();
        assert_eq!(json["type"], "submissions");
        assert_eq!(json["id"], "42");
        assert_eq!(json["op"], "create");
        assert_eq!(json["data"]["id"], "s1");
    }

    #[test]
    fn malformed_record_reports_line() {
        let err = EventLog::parse("{\"type\":\"contest\"}\n\n{\"data\":{}}\n").unwrap_err();
        match err {
            LoadError::Malformed { line, .. } => assert_eq!(line, 3),
            LoadError::Io { .. } => panic!("expected malformed error"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EventLog::load(Path::new("/nonexistent/feedsim/event-feed.ndjson")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn range_is_clamped() {
        let log = EventLog::from_records(vec![EventRecord::new("a"), EventRecord::new("b")]);
        assert_eq!(log.range(0, 10).len(), 2);
        assert_eq!(log.range(1, 2).len(), 1);
        assert!(log.range(2, 2).is_empty());
        assert!(log.range(5, 7).is_empty());
    }
}
