//! Subscriber bookkeeping for the publish channel.
//!
//! Each WebSocket connection registers a bounded channel here; the tracking
//! loop hands finished payloads to [`SubscriberRegistry::broadcast`] and
//! never touches sockets directly. A subscriber whose channel is gone, or
//! who has stopped draining its queue, is dropped during the broadcast that
//! discovers it, so one dead or stalled connection cannot block the rest or
//! hold a growing backlog.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Payloads queued per subscriber before it counts as stalled. At the
/// default tick cadence this is a few seconds of backlog.
pub const SUBSCRIBER_BUFFER: usize = 256;

/// Opaque identifier for one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared set of publish-channel subscribers.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<String>>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its payload channel.
    pub fn register(&self) -> (SubscriberId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = SubscriberId::new();
        self.subscribers.lock().insert(id, tx);
        debug!(subscriber = %id, "subscriber registered");
        (id, rx)
    }

    /// Removes a subscriber. Safe to call after the broadcast path has
    /// already dropped it.
    pub fn unregister(&self, id: SubscriberId) {
        if self.subscribers.lock().remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber unregistered");
        }
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Sends `payload` to every registered subscriber and returns how many
    /// received it. Subscribers whose channel is closed, or whose queue has
    /// gone unread for [`SUBSCRIBER_BUFFER`] payloads, are removed.
    pub fn broadcast(&self, payload: &str) -> usize {
        let targets: Vec<(SubscriberId, mpsc::Sender<String>)> = {
            let guard = self.subscribers.lock();
            guard.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0;
        let mut stale = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "dropping subscriber, queue full");
                    stale.push(id);
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(subscriber = %id, "dropping subscriber, channel closed");
                    stale.push(id);
                }
            }
        }

        if !stale.is_empty() {
            let mut guard = self.subscribers.lock();
            for id in stale {
                guard.remove(&id);
            }
        }

        delivered
    }

    /// Drops every subscriber channel, letting their forward tasks finish.
    pub fn close_all(&self) {
        let mut guard = self.subscribers.lock();
        let drained = guard.len();
        guard.clear();
        if drained > 0 {
            debug!(count = drained, "closed all subscriber channels");
        }
    }
}
