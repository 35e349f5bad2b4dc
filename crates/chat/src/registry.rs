//! In-process fan-out registry bridging message creation to open streams.
//!
//! One broadcast channel per conversation, created lazily on first subscribe
//! and pruned when the last subscriber goes away. The registry is constructed
//! once at startup and shared through application state; a process restart
//! drops every live subscriber, and clients recover through the stream
//! bootstrap on reconnect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{error, warn};

use crate::types::StreamEvent;

/// Default per-conversation channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

type ChannelMap = HashMap<String, broadcast::Sender<Arc<str>>>;

/// Registry of live subscribers keyed by conversation id.
///
/// Cloning is cheap and every clone operates on the same channel map. All
/// operations take a short, synchronous critical section; the lock is never
/// held across an await point.
#[derive(Clone)]
pub struct TopicRegistry {
    channels: Arc<Mutex<ChannelMap>>,
    capacity: usize,
}

impl TopicRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Register a new live subscriber under `conversation_id`.
    ///
    /// The conversation entry is created lazily. Dropping the returned
    /// [`Subscription`] removes the subscriber again; each call produces an
    /// independent handle, so registering cannot double-deliver.
    pub fn subscribe(&self, conversation_id: &str) -> Subscription {
        let receiver = {
            let mut channels = lock_channels(&self.channels);
            channels
                .entry(conversation_id.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };

        Subscription {
            conversation_id: conversation_id.to_string(),
            channels: Arc::clone(&self.channels),
            receiver: Some(receiver),
        }
    }

    /// Deliver `event` to every subscriber currently registered for
    /// `conversation_id`.
    ///
    /// The event is serialized once; all subscribers share the same payload.
    /// An unknown conversation is a no-op, a subscriber that disappeared mid
    /// delivery is skipped, and no failure ever surfaces to the caller.
    pub fn publish(&self, conversation_id: &str, event: &StreamEvent) {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(err) => {
                error!(error = ?err, conversation_id, "failed to encode stream event");
                return;
            }
        };

        let mut channels = lock_channels(&self.channels);
        if let Some(sender) = channels.get(conversation_id) {
            if sender.send(payload).is_err() {
                // Last receiver vanished between unsubscribe and this publish.
                channels.remove(conversation_id);
            }
        }
    }

    /// Number of live subscribers for `conversation_id`.
    pub fn subscriber_count(&self, conversation_id: &str) -> usize {
        lock_channels(&self.channels)
            .get(conversation_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Number of conversations that currently have at least one entry.
    pub fn conversation_count(&self) -> usize {
        lock_channels(&self.channels).len()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Handle for one live subscriber.
///
/// Subscribers have no identity beyond this handle. Dropping it unregisters
/// the subscriber and prunes the conversation entry when it was the last one.
pub struct Subscription {
    conversation_id: String,
    channels: Arc<Mutex<ChannelMap>>,
    receiver: Option<broadcast::Receiver<Arc<str>>>,
}

impl Subscription {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Wait for the next published payload.
    ///
    /// Returns `None` once the channel is gone or the handle was released. A
    /// subscriber that lagged behind the channel capacity skips the missed
    /// frames and keeps receiving; the authoritative message list stays
    /// fetchable over plain HTTP.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        conversation_id = %self.conversation_id,
                        skipped,
                        "subscriber lagged, skipping frames"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Unregister this subscriber.
    ///
    /// Releasing twice, or releasing a handle whose conversation is already
    /// gone, is a no-op.
    pub fn release(&mut self) {
        if self.receiver.take().is_none() {
            return;
        }

        let mut channels = lock_channels(&self.channels);
        if let Some(sender) = channels.get(&self.conversation_id) {
            if sender.receiver_count() == 0 {
                channels.remove(&self.conversation_id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock_channels(channels: &Arc<Mutex<ChannelMap>>) -> MutexGuard<'_, ChannelMap> {
    channels
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
