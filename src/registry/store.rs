//! Subscriber registry implementation
//!
//! Thread-safe via a single `parking_lot::Mutex`. The lock only ever guards
//! map reads and writes; it is never held while a channel is sending.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::channel::FrameChannel;
use super::key::ChannelKey;

/// Shared handle to a subscriber channel
pub type ChannelRef = Arc<dyn FrameChannel>;

/// Live set of channels subscribed to one stream
pub struct SubscriberRegistry {
    /// Map of channel key to channel
    channels: Mutex<HashMap<ChannelKey, ChannelRef>>,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Register a channel
    ///
    /// A channel already registered under `key` is replaced (last write wins)
    /// and returned.
    pub fn add(&self, key: ChannelKey, channel: ChannelRef) -> Option<ChannelRef> {
        let (previous, subscribers) = {
            let mut channels = self.channels.lock();
            let previous = channels.insert(key, channel);
            (previous, channels.len())
        };

        tracing::info!(
            channel = %key,
            subscribers = subscribers,
            replaced = previous.is_some(),
            "Subscriber added"
        );

        previous
    }

    /// Remove the channel registered under `key`
    ///
    /// Absent keys are not an error: a close notification can race with the
    /// pump dropping the same channel after a failed send.
    pub fn remove(&self, key: &ChannelKey) -> Option<ChannelRef> {
        let (removed, subscribers) = {
            let mut channels = self.channels.lock();
            let removed = channels.remove(key);
            (removed, channels.len())
        };

        if removed.is_some() {
            tracing::debug!(channel = %key, subscribers = subscribers, "Subscriber removed");
        }

        removed
    }

    /// Remove `key` only if it still maps to `channel`
    ///
    /// Used when a specific channel instance has failed or closed, so that a
    /// newer channel registered under the same key survives.
    pub fn detach(&self, key: &ChannelKey, channel: &ChannelRef) -> bool {
        let subscribers = {
            let mut channels = self.channels.lock();
            match channels.get(key) {
                Some(current) if same_channel(current, channel) => {
                    channels.remove(key);
                    channels.len()
                }
                _ => return false,
            }
        };

        tracing::debug!(channel = %key, subscribers = subscribers, "Subscriber detached");
        true
    }

    /// Remove every channel, returning how many were registered
    pub fn clear(&self) -> usize {
        let drained: Vec<(ChannelKey, ChannelRef)> = self.channels.lock().drain().collect();

        if !drained.is_empty() {
            tracing::debug!(removed = drained.len(), "Subscribers cleared");
        }

        drained.len()
    }

    /// Copy of the current (key, channel) pairs
    ///
    /// The copy is taken under the lock; later adds and removes do not affect it.
    pub fn snapshot(&self) -> Vec<(ChannelKey, ChannelRef)> {
        self.channels
            .lock()
            .iter()
            .map(|(key, channel)| (*key, Arc::clone(channel)))
            .collect()
    }

    /// Visit every channel present when the call began
    ///
    /// `visit` runs without the lock held and may itself add or remove
    /// channels; the pass is not affected by those changes.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&ChannelKey, &ChannelRef),
    {
        for (key, channel) in self.snapshot() {
            visit(&key, &channel);
        }
    }

    /// Whether a channel is registered under `key`
    pub fn contains(&self, key: &ChannelKey) -> bool {
        self.channels.lock().contains_key(key)
    }

    /// Keys of all registered channels, sorted
    pub fn keys(&self) -> Vec<ChannelKey> {
        let mut keys: Vec<ChannelKey> = self.channels.lock().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Whether no channel is registered
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

// Compares data pointers only; vtable pointers for the same type may differ
// between codegen units.
fn same_channel(a: &ChannelRef, b: &ChannelRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
