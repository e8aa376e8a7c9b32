//! The shared release boundary into the event log.
//!
//! Records `[0, boundary)` are released to every subscriber; the record at
//! `boundary`, if any, is the next candidate. The boundary never decreases.
//!
//! # Concurrency
//!
//! All mutations run inside a single writer lock, so concurrent control
//! requests never interleave a read-modify-write. The committed value is
//! then published through an atomic that streams read without locking,
//! and every registered wake signal is notified once per control call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::broadcast::SubscriptionBroadcaster;
use crate::error::SeekExhausted;
use crate::event::EventLog;
use crate::seek::{self, SeekTarget};

/// Boundary before and after a control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    /// Boundary before the operation.
    pub previous: usize,
    /// Boundary after the operation.
    pub boundary: usize,
}

impl Movement {
    /// Whether the operation released at least one record.
    pub const fn moved(&self) -> bool {
        self.boundary > self.previous
    }
}

/// Single shared release boundary, mutated only through its operations.
#[derive(Debug)]
pub struct ReleaseCursor {
    log: Arc<EventLog>,
    broadcaster: Arc<SubscriptionBroadcaster>,
    /// Writer lock holding the authoritative boundary.
    control: Mutex<usize>,
    /// Last committed boundary, readable without the writer lock.
    released: AtomicUsize,
}

impl ReleaseCursor {
    /// Create the cursor positioned at the first submission of the log.
    ///
    /// The first submission itself is not released. If the log has no
    /// submission the boundary starts saturated at the log length.
    pub fn new(log: Arc<EventLog>, broadcaster: Arc<SubscriptionBroadcaster>) -> Self {
        let initial = seek::seek(&log, 0, seek::is_submission).unwrap_or_else(|| {
            warn!(
                total_events = log.len(),
                "event log has no submissions, releasing the whole log"
            );
            log.len()
        });
        Self::at(log, broadcaster, initial)
    }

    /// Create the cursor at an explicit boundary, clamped to the log length.
    pub fn at(log: Arc<EventLog>, broadcaster: Arc<SubscriptionBroadcaster>, boundary: usize) -> Self {
        let boundary = boundary.min(log.len());
        Self {
            log,
            broadcaster,
            control: Mutex::new(boundary),
            released: AtomicUsize::new(boundary),
        }
    }

    /// Current boundary. Never observed to move backward.
    pub fn boundary(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }

    /// The log this cursor releases.
    pub const fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// The broadcaster notified on every mutation.
    pub const fn broadcaster(&self) -> &Arc<SubscriptionBroadcaster> {
        &self.broadcaster
    }

    /// Release one more record. A no-op once the log is fully released.
    pub fn advance(&self) -> Movement {
        let mut boundary = self.lock();
        let previous = *boundary;
        let next = previous.saturating_add(1).min(self.log.len());
        self.commit(&mut boundary, next);

        let movement = Movement {
            previous,
            boundary: next,
        };
        info!(operation = "advance", previous, boundary = next, "cursor advanced");
        movement
    }

    /// Release everything up to and including the next submission.
    ///
    /// # Errors
    ///
    /// Returns [`SeekExhausted`] when no submission remains; the boundary
    /// is then saturated at the log length.
    pub fn skip_to_next_submission(&self) -> Result<Movement, SeekExhausted> {
        self.skip_to(SeekTarget::Submission)
    }

    /// Release everything up to and including the next accepted judgement.
    ///
    /// # Errors
    ///
    /// Returns [`SeekExhausted`] when no accepted judgement remains; the
    /// boundary is then saturated at the log length.
    pub fn skip_to_next_accepted_judgement(&self) -> Result<Movement, SeekExhausted> {
        self.skip_to(SeekTarget::AcceptedJudgement)
    }

    /// Seek from the current boundary (inclusive) to the next record
    /// matching `target`, then release that record.
    ///
    /// # Errors
    ///
    /// Returns [`SeekExhausted`] when nothing matches before the end of the
    /// log; the boundary is then saturated at the log length.
    pub fn skip_to(&self, target: SeekTarget) -> Result<Movement, SeekExhausted> {
        let mut boundary = self.lock();
        let previous = *boundary;
        let total = self.log.len();

        match seek::seek(&self.log, previous, |event| target.matches(event)) {
            Some(found) => {
                let next = found.saturating_add(1).min(total);
                self.commit(&mut boundary, next);
                info!(
                    operation = target.as_str(),
                    previous,
                    found,
                    boundary = next,
                    "cursor skipped to match"
                );
                Ok(Movement {
                    previous,
                    boundary: next,
                })
            }
            None => {
                self.commit(&mut boundary, total);
                info!(
                    operation = target.as_str(),
                    previous,
                    boundary = total,
                    "no match ahead, log fully drained"
                );
                Err(SeekExhausted {
                    previous,
                    boundary: total,
                })
            }
        }
    }

    /// Store and publish a new boundary, waking subscribers if it moved.
    fn commit(&self, boundary: &mut MutexGuard<'_, usize>, next: usize) {
        if next <= **boundary {
            return;
        }
        **boundary = next;
        self.released.store(next, Ordering::Release);
        self.broadcaster.notify_all();
    }

    // The guarded value is a plain integer and always consistent.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::{Map, Value};

    use super::*;
    use crate::event::EventRecord;

    fn accepted() -> EventRecord {
        let mut data = Map::new();
        data.insert("judgement_type_id".to_owned(), Value::from("AC"));
        EventRecord::new("submissions").with_data(data)
    }

    fn sample_log() -> Arc<EventLog> {
        Arc::new(EventLog::from_records(vec![
            EventRecord::new("contest"),
            EventRecord::new("teams"),
            EventRecord::new("submissions"),
            accepted(),
        ]))
    }

    fn cursor() -> ReleaseCursor {
        ReleaseCursor::new(sample_log(), Arc::new(SubscriptionBroadcaster::new()))
    }

    #[test]
    fn initial_boundary_is_first_submission() {
        assert_eq!(cursor().boundary(), 2);
    }

    #[test]
    fn log_without_submissions_starts_drained() {
        let log = Arc::new(EventLog::from_records(vec![
            EventRecord::new("contest"),
            EventRecord::new("teams"),
        ]));
        let cursor = ReleaseCursor::new(log, Arc::new(SubscriptionBroadcaster::new()));
        assert_eq!(cursor.boundary(), 2);
    }

    #[test]
    fn advance_releases_one_record() {
        let cursor = cursor();
        let movement = cursor.advance();
        assert_eq!(movement, Movement { previous: 2, boundary: 3 });
        assert!(movement.moved());
        assert_eq!(cursor.boundary(), 3);
    }

    #[test]
    fn advance_clamps_at_end() {
        let cursor = cursor();
        cursor.advance();
        cursor.advance();
        let movement = cursor.advance();
        assert_eq!(movement, Movement { previous: 4, boundary: 4 });
        assert!(!movement.moved());
    }

    #[test]
    fn skip_to_submission_is_inclusive() {
        let cursor = cursor();
        cursor.advance();
        let movement = cursor.skip_to_next_submission().unwrap();
        assert_eq!(movement, Movement { previous: 3, boundary: 4 });
    }

    #[test]
    fn skip_to_accepted_from_start() {
        let cursor = ReleaseCursor::at(sample_log(), Arc::new(SubscriptionBroadcaster::new()), 0);
        let movement = cursor.skip_to_next_accepted_judgement().unwrap();
        assert_eq!(movement.boundary, 4);
    }

    #[test]
    fn exhausted_seek_saturates_and_reports() {
        let cursor = ReleaseCursor::at(sample_log(), Arc::new(SubscriptionBroadcaster::new()), 4);
        let err = cursor.skip_to_next_accepted_judgement().unwrap_err();
        assert_eq!(err, SeekExhausted { previous: 4, boundary: 4 });
        assert_eq!(cursor.boundary(), 4);

        let again = cursor.skip_to_next_submission().unwrap_err();
        assert_eq!(again.boundary, 4);
    }

    #[test]
    fn exhausted_seek_drains_remaining_records() {
        let log = Arc::new(EventLog::from_records(vec![
            EventRecord::new("submissions"),
            EventRecord::new("teams"),
            EventRecord::new("teams"),
        ]));
        let cursor = ReleaseCursor::new(log, Arc::new(SubscriptionBroadcaster::new()));
        cursor.advance();
        let err = cursor.skip_to_next_submission().unwrap_err();
        assert_eq!(err, SeekExhausted { previous: 1, boundary: 3 });
        assert_eq!(cursor.boundary(), 3);
    }

    #[test]
    fn boundary_is_monotonic_and_bounded() {
        let log = Arc::new(EventLog::from_records(
            (0..40)
                .map(|i| {
                    if i % 7 == 0 {
                        accepted()
                    } else if i % 3 == 0 {
                        EventRecord::new("submissions")
                    } else {
                        EventRecord::new("judgements")
                    }
                })
                .collect(),
        ));
        let cursor = ReleaseCursor::new(Arc::clone(&log), Arc::new(SubscriptionBroadcaster::new()));
        let mut last = cursor.boundary();
        for step in 0..60 {
            match step % 3 {
                0 => {
                    cursor.advance();
                }
                1 => {
                    let _ = cursor.skip_to_next_submission();
                }
                _ => {
                    let _ = cursor.skip_to_next_accepted_judgement();
                }
            }
            let now = cursor.boundary();
            assert!(now >= last);
            assert!(now <= log.len());
            last = now;
        }
        assert_eq!(last, log.len());
    }

    #[tokio::test]
    async fn mutation_wakes_registered_signals_once() {
        let cursor = cursor();
        let signal = cursor.broadcaster().register();

        cursor.skip_to_next_accepted_judgement().unwrap();
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
        let extra = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn noop_advance_does_not_wake() {
        let cursor = ReleaseCursor::at(sample_log(), Arc::new(SubscriptionBroadcaster::new()), 4);
        let signal = cursor.broadcaster().register();
        cursor.advance();
        let woke = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(woke.is_err());
    }

    #[tokio::test]
    async fn concurrent_advances_do_not_interleave() {
        let log = Arc::new(EventLog::from_records(
            std::iter::once(EventRecord::new("submissions"))
                .chain((0..200).map(|_| EventRecord::new("teams")))
                .collect(),
        ));
        let cursor = Arc::new(ReleaseCursor::new(log, Arc::new(SubscriptionBroadcaster::new())));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cursor = Arc::clone(&cursor);
            handles.push(tokio::task::spawn_blocking(move || {
                for _ in 0..10 {
                    cursor.advance();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cursor.boundary(), 80);
    }
}
