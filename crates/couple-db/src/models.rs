//! Row types that map directly to SQLite rows.
//! Distinct from couple-types API models to keep the DB layer independent;
//! the `From` impls below are the only place the two meet.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;

use couple_types::models::{
    Activity, ActivityComment, GlobalSettings, Image, Message, PlaylistSong, Profile,
    PushSubscription, Reaction,
};

pub struct MessageRow {
    pub id: String,
    pub chat_key: String,
    pub sender: String,
    pub text: String,
    pub kind: String,
    pub image_url: Option<String>,
    pub unlock_at: Option<String>,
    pub status: String,
    pub is_pinned: bool,
    pub reactions: String,
    pub timestamp: Option<String>,
    pub created_at: String,
}

pub struct ActivityRow {
    pub id: String,
    pub text: String,
    pub image_url: Option<String>,
    pub sender: String,
    pub date: String,
    pub status: String,
    pub reactions: String,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub activity_id: String,
    pub sender: String,
    pub text: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub role: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub track_name: Option<String>,
    pub track_artist: Option<String>,
    pub track_image: Option<String>,
    pub is_playing: bool,
    pub updated_at: String,
}

pub struct ImageRow {
    pub id: String,
    pub storage_id: Option<String>,
    pub url: String,
    pub sender: String,
    pub receiver: String,
    pub view_type: String,
    pub viewed: bool,
    pub created_at: String,
}

pub struct SongRow {
    pub id: String,
    pub url: String,
    pub title: String,
    pub effect: String,
    pub chat_key: String,
    pub sort_order: i64,
    pub created_at: String,
}

pub struct PushSubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: String,
}

pub struct SettingsRow {
    pub id: String,
    pub stop_effects: bool,
    pub updated_by: Option<String>,
    pub updated_at: String,
}

/// Current time in the fixed-width form stored in `*_at` columns, so that
/// text ordering matches time ordering.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use "YYYY-MM-DD HH:MM:SS".
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn parse_reactions(raw: &str) -> Vec<Reaction> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt reactions column '{}': {}", raw, e);
        Vec::new()
    })
}

pub fn encode_reactions(reactions: &[Reaction]) -> String {
    serde_json::to_string(reactions).unwrap_or_else(|_| "[]".to_string())
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            reactions: parse_reactions(&row.reactions),
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            chat_key: row.chat_key,
            sender: row.sender,
            text: row.text,
            kind: row.kind,
            image_url: row.image_url,
            unlock_at: row.unlock_at,
            status: row.status,
            is_pinned: row.is_pinned,
            timestamp: row.timestamp,
        }
    }
}

impl ActivityRow {
    pub fn into_activity(self, comments: Vec<ActivityComment>) -> Activity {
        Activity {
            reactions: parse_reactions(&self.reactions),
            created_at: parse_timestamp(&self.created_at),
            id: self.id,
            text: self.text,
            image_url: self.image_url,
            sender: self.sender,
            date: self.date,
            status: self.status,
            comments,
        }
    }
}

impl From<CommentRow> for ActivityComment {
    fn from(row: CommentRow) -> Self {
        ActivityComment {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            activity_id: row.activity_id,
            sender: row.sender,
            text: row.text,
        }
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            updated_at: parse_timestamp(&row.updated_at),
            id: row.id,
            role: row.role,
            name: row.name,
            avatar_url: row.avatar_url,
            latitude: row.latitude,
            longitude: row.longitude,
            track_name: row.track_name,
            track_artist: row.track_artist,
            track_image: row.track_image,
            is_playing: row.is_playing,
        }
    }
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            storage_id: row.storage_id,
            url: row.url,
            sender: row.sender,
            receiver: row.receiver,
            view_type: row.view_type,
            viewed: row.viewed,
        }
    }
}

impl From<SongRow> for PlaylistSong {
    fn from(row: SongRow) -> Self {
        PlaylistSong {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            url: row.url,
            title: row.title,
            effect: row.effect,
            chat_key: row.chat_key,
            order: row.sort_order,
        }
    }
}

impl From<PushSubscriptionRow> for PushSubscription {
    fn from(row: PushSubscriptionRow) -> Self {
        PushSubscription {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            user_id: row.user_id,
            endpoint: row.endpoint,
            p256dh: row.p256dh,
            auth: row.auth,
        }
    }
}

impl From<SettingsRow> for GlobalSettings {
    fn from(row: SettingsRow) -> Self {
        GlobalSettings {
            updated_at: parse_timestamp(&row.updated_at),
            id: row.id,
            stop_effects: row.stop_effects,
            updated_by: row.updated_by,
        }
    }
}
