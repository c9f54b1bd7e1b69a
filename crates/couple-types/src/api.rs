//! Request and response bodies for the HTTP API.
//!
//! Required fields are `Option` so handlers can answer a missing field with a
//! 400 `{error}` body instead of a deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Image, PlaylistSong};

// -- Activities --

#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub sender: Option<String>,
}

/// Exactly one of `status`, `reaction` or `comment` is applied, in that order
/// of precedence.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    pub id: Option<String>,
    pub status: Option<String>,
    pub reaction: Option<String>,
    pub comment: Option<String>,
    pub sender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub activity_id: Option<String>,
    pub text: Option<String>,
    pub user: Option<String>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub user1: Option<String>,
    pub user2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user1: Option<String>,
    pub user2: Option<String>,
    pub message: Option<NewMessage>,
}

/// Message as composed by the client. The client picks the id so its
/// optimistic copy can be matched with the broadcast.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub sender: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub image_url: Option<String>,
    pub unlock_at: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    pub message_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageRequest {
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChatRequest {
    pub chat_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub chat_key: Option<String>,
    pub user: Option<String>,
    #[serde(default)]
    pub is_typing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMessageRequest {
    pub message_id: Option<String>,
    pub is_pinned: Option<bool>,
    pub chat_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactMessageRequest {
    pub message_id: Option<String>,
    pub emoji: Option<String>,
    pub user: Option<String>,
    pub chat_key: Option<String>,
}

// -- Music & location --

/// Shared playlist state; relayed as-is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMusicRequest {
    pub chat_key: Option<String>,
    #[serde(default)]
    pub playlist: Value,
    #[serde(default)]
    pub index: Value,
    #[serde(default)]
    pub is_playing: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicRequest {
    pub role: Option<String>,
    pub track_name: Option<String>,
    pub track_artist: Option<String>,
    pub track_image: Option<String>,
    #[serde(default)]
    pub is_playing: bool,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub role: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    pub role: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

// -- Images --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    /// Hosted URL of the image.
    pub image: Option<String>,
    pub storage_id: Option<String>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub view_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub success: bool,
    pub image: Image,
}

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewImageRequest {
    pub image_id: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewImageResponse {
    pub url: String,
    pub view_type: String,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodNotifyRequest {
    pub from: Option<String>,
    pub to_email: Option<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MissingYouRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub simulated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub subscription: Option<WebPushSubscription>,
    pub user_id: Option<String>,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Deserialize)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub keys: WebPushKeys,
}

#[derive(Debug, Deserialize)]
pub struct WebPushKeys {
    pub p256dh: String,
    pub auth: String,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub stop_effects: Option<bool>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub url: Option<String>,
    pub title: Option<String>,
    pub effect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSongResponse {
    pub success: bool,
    pub song: PlaylistSong,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSongRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
