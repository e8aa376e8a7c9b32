//! Error types for the replay engine.
//!
//! [`LoadError`] is fatal and only produced while the event log is read at
//! startup. [`SeekExhausted`] is informational: the cursor has already
//! saturated at the end of the log when it is returned.

use std::path::PathBuf;

/// Errors that can occur while loading the recorded event log.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The log file could not be read.
    #[error("failed to read event log {}: {source}", .path.display())]
    Io {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A record line could not be decoded.
    #[error("malformed event record on line {line}: {source}")]
    Malformed {
        /// 1-based line number of the offending record.
        line: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// No record matching the seek predicate exists at or after the boundary.
///
/// By the time this is returned the cursor boundary has been saturated at
/// the log length, so callers treat it as "log fully drained".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no matching event at or after {previous} (boundary saturated at {boundary})")]
pub struct SeekExhausted {
    /// Boundary the seek started from.
    pub previous: usize,
    /// Boundary after saturation, equal to the log length.
    pub boundary: usize,
}
