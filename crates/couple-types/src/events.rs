use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event names published on the relay. Clients bind to these strings.
pub mod names {
    pub const NEW_MESSAGE: &str = "new-message";
    pub const MESSAGE_EDITED: &str = "message-edited";
    pub const MESSAGE_DELETED: &str = "message-deleted";
    pub const MESSAGE_REACTION: &str = "message-reaction";
    pub const MESSAGE_PIN: &str = "message-pin";
    pub const CLEAR_CHAT: &str = "clear-chat";
    pub const TYPING: &str = "typing";
    pub const NEW_ACTIVITY: &str = "new-activity";
    pub const ACTIVITY_UPDATE: &str = "activity-update";
    pub const UPDATE_ACTIVITY: &str = "update-activity";
    pub const MUSIC_UPDATE: &str = "music-update";
    pub const LOCATION_UPDATE: &str = "location-update";
    pub const GLOBAL_SETTINGS_UPDATE: &str = "global-settings-update";
    pub const SIGNAL: &str = crate::signal::SIGNAL_EVENT;
}

/// A named event published to one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub data: Value,
}

/// Frames sent over the WebSocket gateway to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Connection accepted; the client may subscribe.
    Ready,

    /// A relay event on a channel the client subscribed to.
    Event(ChannelEvent),
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Add channels to this connection's subscriptions.
    Subscribe { channels: Vec<String> },

    /// Remove channels from this connection's subscriptions.
    Unsubscribe { channels: Vec<String> },
}
