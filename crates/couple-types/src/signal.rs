use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name signals are published under.
pub const SIGNAL_EVENT: &str = "signal";

/// Call signaling message relayed between the two participants.
/// `data` is opaque to the relay (SDP, ICE candidate, or call metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    pub sender: String,
    pub receiver: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    CallInvite,
    Offer,
    Answer,
    Candidate,
    CallDecline,
    Hangup,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallInvite => "call-invite",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::CallDecline => "call-decline",
            Self::Hangup => "hangup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}
