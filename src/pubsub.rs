//! The publish/subscribe bus.
//!
//! Each channel maps subscriber connections (by client address) to their
//! shared socket writers. Publish snapshots the subscriber set under the
//! shared lock and performs the actual socket writes after releasing it,
//! so a slow subscriber never stalls unrelated subscribes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// A connection's write half, shared between its connection task and
/// the components that deliver to it (pub/sub, replication).
pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

#[derive(Default)]
pub struct PubSub {
    channels: HashMap<String, HashMap<String, SharedWriter>>,
}

impl PubSub {
    pub fn new() -> Self {
        PubSub {
            channels: HashMap::new(),
        }
    }

    /// Registers `client` on `channel`. A second subscribe by the same
    /// client is a no-op. Returns the channel's subscriber count.
    pub fn subscribe(&mut self, channel: &str, client: &str, writer: SharedWriter) -> usize {
        let subscribers = self.channels.entry(channel.to_string()).or_default();
        subscribers
            .entry(client.to_string())
            .or_insert(writer);
        subscribers.len()
    }

    pub fn unsubscribe(&mut self, channel: &str, client: &str) {
        if let Some(subscribers) = self.channels.get_mut(channel) {
            subscribers.remove(client);
            if subscribers.is_empty() {
                self.channels.remove(channel);
            }
        }
    }

    /// Drops every subscription held by `client`, used on disconnect.
    pub fn unsubscribe_all(&mut self, client: &str) {
        self.channels.retain(|_, subscribers| {
            subscribers.remove(client);
            !subscribers.is_empty()
        });
    }

    /// Snapshot of the writers currently subscribed to `channel`.
    pub fn subscribers(&self, channel: &str) -> Vec<SharedWriter> {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}
