//! Client side of a two-party call: the signaling state machine that drives
//! a peer connection over the `/api/chat/signal` relay.

pub mod error;
pub mod peer;
pub mod session;
pub mod sink;

pub use error::CallError;
pub use peer::{IceCandidate, PeerConnection, PeerFactory, SessionDescription};
pub use session::{CallRole, CallSession, CallState};
pub use sink::{HttpSignalSink, SignalSink};
