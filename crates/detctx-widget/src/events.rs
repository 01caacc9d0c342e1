//! Detection-changed notifications from the host shell.
//!
//! The host publishes the focused detection id; listeners subscribe and get
//! a [`Subscription`] handle that stops them when unsubscribed or dropped.

use detctx_core::detection_id_from_event;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 64;

pub struct DetectionEvents {
    tx: broadcast::Sender<String>,
}

impl Default for DetectionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Announce a newly focused detection. Returns how many listeners got it.
    pub fn publish(&self, detection_id: &str) -> usize {
        self.tx.send(detection_id.to_string()).unwrap_or(0)
    }

    /// Announce from a raw host "data" event payload; payloads without an id are ignored.
    pub fn publish_event(&self, payload: &Value) -> usize {
        match detection_id_from_event(payload) {
            Some(detection_id) => self.publish(&detection_id),
            None => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A running listener. Dropping it stops the listener too.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
