use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use couple_types::signal::MediaKind;

/// SDP offer or answer, in the browser's `RTCSessionDescriptionInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp: String,
}

/// `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// The media engine side of a call. Implementations wrap a real WebRTC stack;
/// the session only needs these operations.
#[async_trait]
pub trait PeerConnection: Send {
    /// Create an offer and install it as the local description.
    async fn create_offer(&mut self) -> anyhow::Result<SessionDescription>;

    /// Create an answer to the current remote offer and install it locally.
    async fn create_answer(&mut self) -> anyhow::Result<SessionDescription>;

    async fn set_remote_description(&mut self, desc: SessionDescription) -> anyhow::Result<()>;

    fn has_remote_description(&self) -> bool;

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> anyhow::Result<()>;

    async fn close(&mut self);
}

pub trait PeerFactory: Send + Sync {
    fn create(&self, media: MediaKind) -> anyhow::Result<Box<dyn PeerConnection>>;
}
