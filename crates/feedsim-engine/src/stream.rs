//! Per-subscriber replay of the released prefix.
//!
//! An [`EventStream`] starts at position 0, so a late joiner still sees
//! the whole released prefix. It then alternates between draining
//! `[position, boundary)` and suspending on its wake signal. The stream
//! never ends on its own; dropping it deregisters the wake signal.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::broadcast::{SubscriberId, WakeSignal};
use crate::cursor::ReleaseCursor;
use crate::event::EventRecord;
use crate::rewrite::TimestampRewriter;

/// One rewritten record delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emission {
    /// Position of the source record in the log.
    pub index: usize,
    /// Rewritten copy of the source record.
    pub record: EventRecord,
}

/// Lazy, infinite, non-restartable sequence of released records.
#[derive(Debug)]
pub struct EventStream {
    cursor: Arc<ReleaseCursor>,
    rewriter: Arc<TimestampRewriter>,
    signal: WakeSignal,
    position: usize,
}

impl EventStream {
    /// Register a new subscriber with the cursor's broadcaster.
    pub fn open(cursor: Arc<ReleaseCursor>, rewriter: Arc<TimestampRewriter>) -> Self {
        let signal = cursor.broadcaster().register();
        Self {
            cursor,
            rewriter,
            signal,
            position: 0,
        }
    }

    /// Identifier of this subscriber.
    pub const fn id(&self) -> SubscriberId {
        self.signal.id()
    }

    /// Number of records delivered so far.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Wait for newly released records and return them in index order.
    ///
    /// Never returns an empty batch. Cancel-safe: the position only moves
    /// in the same synchronous step that builds the returned batch.
    pub async fn next_batch(&mut self) -> Vec<Emission> {
        loop {
            let boundary = self.cursor.boundary();
            if boundary > self.position {
                return self.drain(boundary);
            }
            self.signal.wait().await;
        }
    }

    fn drain(&mut self, boundary: usize) -> Vec<Emission> {
        let start = self.position;
        let batch = self
            .cursor
            .log()
            .range(start, boundary)
            .iter()
            .zip(start..)
            .map(|(record, index)| Emission {
                index,
                record: self.rewriter.rewrite(record),
            })
            .collect();
        self.position = boundary;
        batch
    }

    /// Flatten the batches into a [`Stream`] of single emissions.
    pub fn into_stream(self) -> impl Stream<Item = Emission> + Send + 'static {
        futures::stream::unfold(self, |mut stream| async move {
            let batch = stream.next_batch().await;
            Some((futures::stream::iter(batch), stream))
        })
        .flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::{Map, Value};

    use super::*;
    use crate::broadcast::SubscriptionBroadcaster;
    use crate::event::EventLog;
    use crate::rewrite::StartClock;

    fn accepted() -> EventRecord {
        let mut data = Map::new();
        data.insert("judgement_type_id".to_owned(), Value::from("AC"));
        EventRecord::new("submissions").with_data(data)
    }

    fn setup() -> (Arc<ReleaseCursor>, Arc<TimestampRewriter>) {
        let log = Arc::new(EventLog::from_records(vec![
            EventRecord::new("contest"),
            EventRecord::new("teams"),
            EventRecord::new("submissions"),
            accepted(),
        ]));
        let cursor = Arc::new(ReleaseCursor::new(log, Arc::new(SubscriptionBroadcaster::new())));
        let rewriter = Arc::new(TimestampRewriter::new(StartClock::capture()));
        (cursor, rewriter)
    }

    fn indices(batch: &[Emission]) -> Vec<usize> {
        batch.iter().map(|e| e.index).collect()
    }

    async fn next(stream: &mut EventStream) -> Vec<Emission> {
        tokio::time::timeout(Duration::from_secs(1), stream.next_batch())
            .await
            .unwrap()
    }

    async fn assert_suspended(stream: &mut EventStream) {
        let pending = tokio::time::timeout(Duration::from_millis(50), stream.next_batch()).await;
        assert!(pending.is_err(), "stream should be waiting for a release");
    }

    #[tokio::test]
    async fn replays_released_prefix_then_suspends() {
        let (cursor, rewriter) = setup();
        let mut stream = EventStream::open(Arc::clone(&cursor), rewriter);

        assert_eq!(indices(&next(&mut stream).await), vec![0, 1]);
        assert_eq!(stream.position(), 2);
        assert_suspended(&mut stream).await;

        cursor.advance();
        assert_eq!(indices(&next(&mut stream).await), vec![2]);
        assert_suspended(&mut stream).await;
    }

    #[tokio::test]
    async fn coalesced_wakes_deliver_every_record_once() {
        let (cursor, rewriter) = setup();
        let mut stream = EventStream::open(Arc::clone(&cursor), rewriter);
        assert_eq!(indices(&next(&mut stream).await), vec![0, 1]);

        cursor.advance();
        cursor.advance();
        cursor.advance();

        assert_eq!(indices(&next(&mut stream).await), vec![2, 3]);
        assert_suspended(&mut stream).await;
    }

    #[tokio::test]
    async fn late_joiner_sees_whole_prefix() {
        let (cursor, rewriter) = setup();
        let mut early = EventStream::open(Arc::clone(&cursor), Arc::clone(&rewriter));
        let _ = next(&mut early).await;

        cursor.skip_to_next_accepted_judgement().unwrap();
        let mut late = EventStream::open(Arc::clone(&cursor), rewriter);

        assert_eq!(indices(&next(&mut early).await), vec![2, 3]);
        assert_eq!(indices(&next(&mut late).await), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn contest_start_time_matches_across_subscribers() {
        let (cursor, rewriter) = setup();
        let mut first = EventStream::open(Arc::clone(&cursor), Arc::clone(&rewriter));
        let mut second = EventStream::open(Arc::clone(&cursor), rewriter);

        let a = next(&mut first).await;
        let b = next(&mut second).await;
        assert_eq!(a[0].record.data_field("start_time"), b[0].record.data_field("start_time"));
    }

    #[tokio::test]
    async fn drop_deregisters_wake_signal() {
        let (cursor, rewriter) = setup();
        let stream = EventStream::open(Arc::clone(&cursor), rewriter);
        assert_eq!(cursor.broadcaster().len(), 1);
        drop(stream);
        assert!(cursor.broadcaster().is_empty());
    }

    #[tokio::test]
    async fn into_stream_yields_in_order_and_cleans_up() {
        let (cursor, rewriter) = setup();
        let mut stream = Box::pin(EventStream::open(Arc::clone(&cursor), rewriter).into_stream());

        let mut seen = Vec::new();
        for _ in 0..2 {
            seen.push(stream.next().await.unwrap().index);
        }
        cursor.skip_to_next_submission().unwrap();
        cursor.advance();
        for _ in 0..2 {
            let emission = tokio::time::timeout(Duration::from_secs(1), stream.next())
                .await
                .unwrap()
                .unwrap();
            seen.push(emission.index);
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);

        drop(stream);
        assert!(cursor.broadcaster().is_empty());
    }

    #[tokio::test]
    async fn concurrent_subscribers_receive_identical_index_sets() {
        let (cursor, rewriter) = setup();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let mut stream = EventStream::open(Arc::clone(&cursor), Arc::clone(&rewriter));
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while seen.len() < 4 {
                    seen.extend(indices(&stream.next_batch().await));
                }
                seen
            }));
        }

        cursor.advance();
        tokio::task::yield_now().await;
        cursor.advance();

        for handle in handles {
            let seen = tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(seen, vec![0, 1, 2, 3]);
        }
    }
}
