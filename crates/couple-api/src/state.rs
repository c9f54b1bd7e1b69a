use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use couple_db::Database;
use couple_gateway::Publisher;

use crate::error::ApiResult;
use crate::mailer::Mailer;
use crate::push::{PushNotification, PushOutcome, PushSender};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub publisher: Arc<dyn Publisher>,
    pub mailer: Mailer,
    pub push: PushSender,
}

impl AppStateInner {
    /// Run blocking DB work off the async runtime.
    pub async fn with_db<F, T>(self: &Arc<Self>, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        Ok(tokio::task::spawn_blocking(move || f(&state.db)).await??)
    }

    /// Publish to a channel. Failures are logged and swallowed: the caller's
    /// write already happened and is still reported to the client.
    pub async fn publish<T: Serialize>(&self, channel: &str, event: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode {} payload: {}", event, e);
                return;
            }
        };
        if let Err(e) = self.publisher.publish(channel, event, payload).await {
            warn!("Publish of {} on {} failed: {:#}", event, channel, e);
        }
    }

    /// Push-notify every browser `role` subscribed from. Dead subscriptions
    /// are pruned; other failures are logged.
    pub async fn notify_user(self: &Arc<Self>, role: &str, title: &str, body: &str) {
        if !self.push.is_enabled() {
            debug!("Push disabled, not notifying {}: {}", role, title);
            return;
        }

        let owner = role.to_string();
        let subscriptions = match self.with_db(move |db| db.push_subscriptions_for(&owner)).await {
            Ok(subs) => subs,
            Err(e) => {
                warn!("Loading push subscriptions for {} failed: {}", role, e);
                return;
            }
        };
        if subscriptions.is_empty() {
            info!("No active push subscriptions for {}", role);
            return;
        }

        let notification = PushNotification::new(title, body);
        for sub in subscriptions {
            match self.push.send(&sub, &notification).await {
                Ok(Some(PushOutcome::Expired)) => {
                    info!("Push subscription {} expired, removing", sub.id);
                    let id = sub.id.clone();
                    if let Err(e) = self.with_db(move |db| db.delete_push_subscription(&id)).await {
                        warn!("Removing push subscription {} failed: {}", sub.id, e);
                    }
                }
                Ok(Some(PushOutcome::Rejected(status))) => {
                    warn!("Push service rejected subscription {}: {}", sub.id, status);
                }
                Ok(_) => {}
                Err(e) => warn!("Push to subscription {} failed: {:#}", sub.id, e),
            }
        }
        info!("Push notification \"{}\" sent to {}", title, role);
    }
}
