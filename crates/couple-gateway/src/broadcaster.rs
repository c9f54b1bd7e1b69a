use async_trait::async_trait;
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::publisher::Publisher;
use crate::pusher::PusherClient;

/// The publisher the HTTP layer talks to: always relays through the local
/// gateway, and mirrors to Pusher when credentials are configured.
#[derive(Clone)]
pub struct Broadcaster {
    dispatcher: Dispatcher,
    pusher: Option<PusherClient>,
}

impl Broadcaster {
    pub fn new(dispatcher: Dispatcher, pusher: Option<PusherClient>) -> Self {
        Self { dispatcher, pusher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn has_pusher(&self) -> bool {
        self.pusher.is_some()
    }
}

#[async_trait]
impl Publisher for Broadcaster {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> anyhow::Result<()> {
        let Some(pusher) = &self.pusher else {
            return self.dispatcher.publish(channel, event, payload).await;
        };

        self.dispatcher.publish(channel, event, payload.clone()).await?;
        pusher.publish(channel, event, payload).await
    }
}
