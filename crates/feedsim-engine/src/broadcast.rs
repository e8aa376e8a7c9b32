//! Registry of per-subscriber wake signals.
//!
//! Each connected subscriber owns one [`WakeSignal`]. Every cursor
//! mutation calls [`SubscriptionBroadcaster::notify_all`], which wakes
//! every registered signal.
//!
//! Signals are level-triggered: a [`Notify`] holds at most one stored
//! permit, so any number of notifications that land before the subscriber
//! next waits collapse into a single wake-up. The subscriber then catches
//! up to whatever boundary is current when it resumes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

/// Identifier of a connected subscriber, UUID v7 (time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared set of wake signals, one per active subscriber.
#[derive(Debug, Default)]
pub struct SubscriptionBroadcaster {
    signals: Mutex<HashMap<SubscriberId, Arc<Notify>>>,
}

impl SubscriptionBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new wake signal.
    ///
    /// The returned [`WakeSignal`] deregisters itself when dropped.
    pub fn register(self: &Arc<Self>) -> WakeSignal {
        let id = SubscriberId::new();
        let notify = Arc::new(Notify::new());
        let active = {
            let mut signals = self.lock();
            signals.insert(id, Arc::clone(&notify));
            signals.len()
        };
        debug!(subscriber = %id, active, "wake signal registered");
        WakeSignal {
            id,
            notify,
            broadcaster: Arc::clone(self),
        }
    }

    /// Remove a wake signal from the registry.
    ///
    /// Returns `false` if the id was not registered.
    pub fn deregister(&self, id: SubscriberId) -> bool {
        let (removed, active) = {
            let mut signals = self.lock();
            let removed = signals.remove(&id).is_some();
            (removed, signals.len())
        };
        if removed {
            info!(subscriber = %id, active, "subscriber disconnected");
        }
        removed
    }

    /// Wake every registered signal. Returns the number of signals woken.
    pub fn notify_all(&self) -> usize {
        let signals = self.lock();
        for notify in signals.values() {
            notify.notify_one();
        }
        signals.len()
    }

    /// Number of registered signals.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no signals are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Arc<Notify>>> {
        self.signals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A subscriber's registered wake signal.
///
/// Dropping it removes the signal from the broadcaster, so a disconnected
/// subscriber never lingers in the registry.
#[derive(Debug)]
pub struct WakeSignal {
    id: SubscriberId,
    notify: Arc<Notify>,
    broadcaster: Arc<SubscriptionBroadcaster>,
}

impl WakeSignal {
    /// Identifier this signal is registered under.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Suspend until the signal fires.
    ///
    /// Returns immediately if a notification arrived since the last wait.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl Drop for WakeSignal {
    fn drop(&mut self) {
        self.broadcaster.deregister(self.id);
    }
}
