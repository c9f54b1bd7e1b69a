use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;
use uuid::Uuid;

use couple_types::events::ChannelEvent;

use crate::publisher::Publisher;

/// In-process relay hub. Every published event goes onto one broadcast
/// channel; each gateway connection keeps the events for the channel keys it
/// subscribed to.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for relay events; every connection sees every event
    broadcast_tx: broadcast::Sender<Arc<ChannelEvent>>,

    /// Per-connection subscriptions: conn_id -> channel keys
    subscriptions: RwLock<HashMap<Uuid, HashSet<String>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                subscriptions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Broadcast an event to all connections. Returns how many receivers
    /// were live; zero is not an error.
    pub fn broadcast(&self, event: ChannelEvent) -> usize {
        self.inner.broadcast_tx.send(Arc::new(event)).unwrap_or(0)
    }

    /// Register a connection. Returns its id and a receiver of all events.
    pub async fn register_connection(&self) -> (Uuid, broadcast::Receiver<Arc<ChannelEvent>>) {
        let conn_id = Uuid::new_v4();
        let rx = self.inner.broadcast_tx.subscribe();
        self.inner
            .subscriptions
            .write()
            .await
            .insert(conn_id, HashSet::new());
        (conn_id, rx)
    }

    pub async fn unregister_connection(&self, conn_id: Uuid) {
        self.inner.subscriptions.write().await.remove(&conn_id);
    }

    pub async fn subscribe_channels(&self, conn_id: Uuid, channels: Vec<String>) {
        let mut subs = self.inner.subscriptions.write().await;
        if let Some(set) = subs.get_mut(&conn_id) {
            set.extend(channels);
        }
    }

    pub async fn unsubscribe_channels(&self, conn_id: Uuid, channels: &[String]) {
        let mut subs = self.inner.subscriptions.write().await;
        if let Some(set) = subs.get_mut(&conn_id) {
            for channel in channels {
                set.remove(channel);
            }
        }
    }

    pub async fn is_subscribed(&self, conn_id: Uuid, channel: &str) -> bool {
        self.inner
            .subscriptions
            .read()
            .await
            .get(&conn_id)
            .is_some_and(|set| set.contains(channel))
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.subscriptions.read().await.len()
    }

    /// Number of connections currently subscribed to `channel`.
    pub async fn channel_subscribers(&self, channel: &str) -> usize {
        self.inner
            .subscriptions
            .read()
            .await
            .values()
            .filter(|set| set.contains(channel))
            .count()
    }
}

#[async_trait]
impl Publisher for Dispatcher {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> anyhow::Result<()> {
        let receivers = self.broadcast(ChannelEvent {
            channel: channel.to_string(),
            event: event.to_string(),
            data: payload,
        });
        trace!("Relayed {} on {} to {} receivers", event, channel, receivers);
        Ok(())
    }
}
