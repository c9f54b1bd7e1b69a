use thiserror::Error;

use crate::session::CallState;

#[derive(Error, Debug)]
pub enum CallError {
    #[error("cannot {op} while {state:?}")]
    InvalidState { op: &'static str, state: CallState },

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("peer connection: {0:#}")]
    Peer(anyhow::Error),

    #[error("signal transport: {0:#}")]
    Signal(anyhow::Error),
}

pub type CallResult<T> = Result<T, CallError>;
