//! Predicate scanning over the event log.
//!
//! Seeking is pure: it never touches the cursor, it only reports the
//! smallest index at or after `start` whose record matches.

use serde_json::Value;

use crate::event::{EventLog, EventRecord, KIND_SUBMISSIONS};

/// Judgement type id of an accepted verdict.
pub const ACCEPTED: &str = "AC";

/// Whether the record is a submission event.
pub fn is_submission(event: &EventRecord) -> bool {
    event.kind == KIND_SUBMISSIONS
}

/// Whether the record carries an accepted judgement.
pub fn is_accepted_judgement(event: &EventRecord) -> bool {
    event.data_field("judgement_type_id").and_then(Value::as_str) == Some(ACCEPTED)
}

/// Named seek predicates exposed as control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekTarget {
    /// The next `submissions` event.
    Submission,
    /// The next event whose judgement is `AC`.
    AcceptedJudgement,
}

impl SeekTarget {
    /// Evaluate the predicate for this target.
    pub fn matches(self, event: &EventRecord) -> bool {
        match self {
            Self::Submission => is_submission(event),
            Self::AcceptedJudgement => is_accepted_judgement(event),
        }
    }

    /// Short name used in logs and acknowledgements.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "next_submission",
            Self::AcceptedJudgement => "next_accepted",
        }
    }
}

/// Return the smallest index `>= start` whose record satisfies `predicate`.
///
/// `None` means the scan reached the end of the log without a match.
pub fn seek<P>(log: &EventLog, start: usize, predicate: P) -> Option<usize>
where
    P: Fn(&EventRecord) -> bool,
{
    log.records()
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, event)| predicate(event))
        .map(|(index, _)| index)
}
