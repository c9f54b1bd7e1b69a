use std::collections::VecDeque;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, trace, warn};

use couple_types::signal::{MediaKind, SignalKind, SignalMessage};

use crate::error::{CallError, CallResult};
use crate::peer::{IceCandidate, PeerConnection, PeerFactory, SessionDescription};
use crate::sink::SignalSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    Connecting,
    Connected,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Caller,
    Receiver,
}

/// One participant's view of a call with their partner.
///
/// ICE candidates that arrive before the remote description is known are
/// queued and applied in arrival order once it is set.
pub struct CallSession<F, S> {
    local: String,
    remote: String,
    factory: F,
    sink: S,
    state: CallState,
    role: Option<CallRole>,
    media: MediaKind,
    peer: Option<Box<dyn PeerConnection>>,
    pending_offer: Option<SessionDescription>,
    candidates: VecDeque<IceCandidate>,
}

impl<F: PeerFactory, S: SignalSink> CallSession<F, S> {
    pub fn new(local: impl Into<String>, remote: impl Into<String>, factory: F, sink: S) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
            factory,
            sink,
            state: CallState::Idle,
            role: None,
            media: MediaKind::Audio,
            peer: None,
            pending_offer: None,
            candidates: VecDeque::new(),
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn role(&self) -> Option<CallRole> {
        self.role
    }

    pub fn media(&self) -> MediaKind {
        self.media
    }

    pub fn queued_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn has_pending_offer(&self) -> bool {
        self.pending_offer.is_some()
    }

    /// Ring the partner: create a peer, send the invite and our offer.
    pub async fn start_call(&mut self, media: MediaKind) -> CallResult<()> {
        if !matches!(self.state, CallState::Idle | CallState::Ended) {
            return Err(self.invalid("start a call"));
        }
        self.reset();

        let mut peer = self.factory.create(media).map_err(CallError::Peer)?;
        let offer = peer.create_offer().await.map_err(CallError::Peer)?;
        self.peer = Some(peer);
        self.role = Some(CallRole::Caller);
        self.media = media;
        self.state = CallState::Ringing;
        info!("Calling {} ({:?})", self.remote, media);

        self.signal(SignalKind::CallInvite, json!({ "type": media }))
            .await?;
        self.signal(SignalKind::Offer, encode("offer", &offer)?).await
    }

    /// Answer a ringing call. The offer may already be here or arrive later.
    pub async fn accept(&mut self) -> CallResult<()> {
        if self.state != CallState::Ringing || self.role != Some(CallRole::Receiver) {
            return Err(self.invalid("accept"));
        }

        self.peer = Some(self.factory.create(self.media).map_err(CallError::Peer)?);
        self.state = CallState::Connecting;

        if let Some(offer) = self.pending_offer.take() {
            self.apply_offer(offer).await?;
        }
        Ok(())
    }

    pub async fn decline(&mut self) -> CallResult<()> {
        if self.state != CallState::Ringing || self.role != Some(CallRole::Receiver) {
            return Err(self.invalid("decline"));
        }
        self.teardown().await;
        self.signal(SignalKind::CallDecline, json!({})).await
    }

    /// End the call locally and tell the partner.
    pub async fn hangup(&mut self) -> CallResult<()> {
        if matches!(self.state, CallState::Idle | CallState::Ended) {
            return Err(self.invalid("hang up"));
        }
        self.teardown().await;
        self.signal(SignalKind::Hangup, json!({})).await
    }

    /// Media is flowing.
    pub fn mark_connected(&mut self) -> CallResult<()> {
        if self.state != CallState::Connecting {
            return Err(self.invalid("mark connected"));
        }
        self.state = CallState::Connected;
        info!("Call with {} connected", self.remote);
        Ok(())
    }

    /// Relay a candidate our own peer gathered.
    pub async fn send_local_candidate(&self, candidate: &IceCandidate) -> CallResult<()> {
        self.signal(SignalKind::Candidate, encode("candidate", candidate)?)
            .await
    }

    /// Feed one message from the relay channel.
    pub async fn handle_signal(&mut self, msg: SignalMessage) -> CallResult<()> {
        if msg.receiver != self.local {
            trace!("Ignoring {} addressed to {}", msg.kind.as_str(), msg.receiver);
            return Ok(());
        }
        debug!("Received {} from {}", msg.kind.as_str(), msg.sender);

        match msg.kind {
            SignalKind::CallInvite => {
                if let Some(mut stale) = self.peer.take() {
                    stale.close().await;
                }
                self.reset();
                self.media = msg
                    .data
                    .get("type")
                    .and_then(|t| serde_json::from_value(t.clone()).ok())
                    .unwrap_or(MediaKind::Audio);
                self.role = Some(CallRole::Receiver);
                self.state = CallState::Ringing;
                info!("Incoming {:?} call from {}", self.media, msg.sender);
            }
            SignalKind::Offer => {
                let offer: SessionDescription = decode("offer", msg.data)?;
                if self.peer.is_some() {
                    self.apply_offer(offer).await?;
                } else {
                    self.pending_offer = Some(offer);
                }
            }
            SignalKind::Answer => {
                let answer: SessionDescription = decode("answer", msg.data)?;
                let Some(peer) = self.peer.as_mut() else {
                    warn!("Answer from {} with no call in progress", msg.sender);
                    return Ok(());
                };
                peer.set_remote_description(answer)
                    .await
                    .map_err(CallError::Peer)?;
                self.flush_candidates().await;
                self.state = CallState::Connecting;
            }
            SignalKind::Candidate => {
                let candidate: IceCandidate = decode("candidate", msg.data)?;
                if matches!(self.state, CallState::Idle | CallState::Ended) {
                    debug!("Dropping candidate from {} outside a call", msg.sender);
                    return Ok(());
                }
                match self.peer.as_mut() {
                    Some(peer) if peer.has_remote_description() => {
                        if let Err(e) = peer.add_ice_candidate(candidate).await {
                            warn!("Failed to add ICE candidate: {:#}", e);
                        }
                    }
                    _ => self.candidates.push_back(candidate),
                }
            }
            SignalKind::CallDecline => {
                info!("{} declined the call", msg.sender);
                self.teardown().await;
            }
            SignalKind::Hangup => {
                info!("{} hung up", msg.sender);
                self.teardown().await;
            }
        }
        Ok(())
    }

    async fn apply_offer(&mut self, offer: SessionDescription) -> CallResult<()> {
        let Some(peer) = self.peer.as_mut() else {
            self.pending_offer = Some(offer);
            return Ok(());
        };
        peer.set_remote_description(offer)
            .await
            .map_err(CallError::Peer)?;
        let answer = peer.create_answer().await.map_err(CallError::Peer)?;
        self.signal(SignalKind::Answer, encode("answer", &answer)?)
            .await?;
        self.flush_candidates().await;
        Ok(())
    }

    async fn flush_candidates(&mut self) {
        let Some(peer) = self.peer.as_mut() else {
            return;
        };
        while let Some(candidate) = self.candidates.pop_front() {
            if let Err(e) = peer.add_ice_candidate(candidate).await {
                warn!("Failed to add queued ICE candidate: {:#}", e);
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(mut peer) = self.peer.take() {
            peer.close().await;
        }
        self.pending_offer = None;
        self.candidates.clear();
        self.state = CallState::Ended;
    }

    fn reset(&mut self) {
        self.role = None;
        self.pending_offer = None;
        self.candidates.clear();
    }

    async fn signal(&self, kind: SignalKind, data: Value) -> CallResult<()> {
        let msg = SignalMessage {
            sender: self.local.clone(),
            receiver: self.remote.clone(),
            kind,
            data,
        };
        self.sink.send(msg).await.map_err(|e| {
            warn!("Sending {} to {} failed: {:#}", kind.as_str(), self.remote, e);
            CallError::Signal(e)
        })
    }

    fn invalid(&self, op: &'static str) -> CallError {
        CallError::InvalidState {
            op,
            state: self.state,
        }
    }
}

fn encode<T: Serialize>(kind: &'static str, value: &T) -> CallResult<Value> {
    serde_json::to_value(value).map_err(|source| CallError::Payload { kind, source })
}

fn decode<T: DeserializeOwned>(kind: &'static str, data: Value) -> CallResult<T> {
    serde_json::from_value(data).map_err(|source| CallError::Payload { kind, source })
}
