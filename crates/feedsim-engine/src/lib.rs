//! Replay engine for the contest event feed simulator.
//!
//! A recorded, immutable [`EventLog`] is released to any number of
//! subscribers under manual operator control:
//!
//! - **[`ReleaseCursor`]** holds the single shared boundary. Records
//!   before it are released. Control operations advance it by one or skip
//!   to the next submission / accepted judgement.
//! - **[`SubscriptionBroadcaster`]** keeps one wake signal per subscriber
//!   and wakes them all whenever the boundary moves.
//! - **[`EventStream`]** replays the released prefix to one subscriber
//!   from the beginning, then suspends until woken and catches up.
//! - **[`TimestampRewriter`]** stamps each emitted copy with a live-looking
//!   contest start and emission time.
//!
//! The engine has no transport; `feedsim-server` exposes it over HTTP.

pub mod broadcast;
pub mod cursor;
pub mod error;
pub mod event;
pub mod rewrite;
pub mod seek;
pub mod stream;

pub use broadcast::{SubscriberId, SubscriptionBroadcaster, WakeSignal};
pub use cursor::{Movement, ReleaseCursor};
pub use error::{LoadError, SeekExhausted};
pub use event::{EventLog, EventRecord};
pub use rewrite::{StartClock, TimestampRewriter};
pub use seek::SeekTarget;
pub use stream::{Emission, EventStream};
