use async_trait::async_trait;
use serde_json::Value;

/// Fire-and-forget delivery of a named event to every current subscriber of
/// `channel`. Delivery and ordering are whatever the backend provides.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> anyhow::Result<()>;
}
