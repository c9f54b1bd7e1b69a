use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One emoji reaction. Messages and activities carry the full list and
/// rewrite it on every toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub user: String,
}

/// Toggle `user`'s `emoji` in place. Returns true if the reaction was added.
pub fn toggle_reaction(reactions: &mut Vec<Reaction>, user: &str, emoji: &str) -> bool {
    if let Some(idx) = reactions
        .iter()
        .position(|r| r.user == user && r.emoji == emoji)
    {
        reactions.remove(idx);
        false
    } else {
        reactions.push(Reaction {
            emoji: emoji.to_string(),
            user: user.to_string(),
        });
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_key: String,
    pub sender: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image_url: Option<String>,
    pub unlock_at: Option<String>,
    pub status: String,
    pub is_pinned: bool,
    pub reactions: Vec<Reaction>,
    pub timestamp: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub text: String,
    pub image_url: Option<String>,
    pub sender: String,
    pub date: String,
    pub status: String,
    pub reactions: Vec<Reaction>,
    pub comments: Vec<ActivityComment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityComment {
    pub id: String,
    pub activity_id: String,
    pub sender: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
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
    pub updated_at: DateTime<Utc>,
}

pub const VIEW_PERMANENT: &str = "permanent";
pub const VIEW_ONE_TIME: &str = "one-time";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub storage_id: Option<String>,
    pub url: String,
    pub sender: String,
    pub receiver: String,
    pub view_type: String,
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub id: String,
    pub url: String,
    pub title: String,
    pub effect: String,
    pub chat_key: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub id: String,
    pub stop_effects: bool,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_present_absent_present() {
        let mut reactions = vec![];

        assert!(toggle_reaction(&mut reactions, "sajid", "❤️"));
        assert_eq!(reactions.len(), 1);

        assert!(!toggle_reaction(&mut reactions, "sajid", "❤️"));
        assert!(reactions.is_empty());

        assert!(toggle_reaction(&mut reactions, "sajid", "❤️"));
        assert_eq!(
            reactions,
            vec![Reaction { emoji: "❤️".into(), user: "sajid".into() }]
        );
    }

    #[test]
    fn toggle_only_touches_matching_pair() {
        let mut reactions = vec![
            Reaction { emoji: "😂".into(), user: "nasywa".into() },
            Reaction { emoji: "❤️".into(), user: "sajid".into() },
        ];

        toggle_reaction(&mut reactions, "nasywa", "❤️");
        assert_eq!(reactions.len(), 3);

        toggle_reaction(&mut reactions, "sajid", "❤️");
        assert_eq!(reactions.len(), 2);
        assert!(reactions.iter().all(|r| r.user == "nasywa"));
    }

    #[test]
    fn message_uses_camel_case_and_type_field() {
        let msg = Message {
            id: "msg-1".into(),
            chat_key: "nasywa-sajid".into(),
            sender: "sajid".into(),
            text: "hi".into(),
            kind: "text".into(),
            image_url: None,
            unlock_at: None,
            status: "sent".into(),
            is_pinned: false,
            reactions: vec![],
            timestamp: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["chatKey"], "nasywa-sajid");
        assert_eq!(value["isPinned"], false);
    }
}
