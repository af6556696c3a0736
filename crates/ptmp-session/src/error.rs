use ptmp_frame::{FrameError, MessageType};
use ptmp_transport::TransportError;

use crate::state::SessionState;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (connect, resolve, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error (codec violation or stream I/O).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The operation is not allowed in the current session state.
    /// Nothing was written to the wire.
    #[error("{operation} is not valid in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The server's negotiation response is not acceptable.
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    /// The server rejected the authentication response.
    #[error("authentication rejected for user '{username}'")]
    AuthenticationFailed { username: String },

    /// A frame of the wrong type arrived.
    #[error("expected {expected}, got {actual}")]
    UnexpectedMessage {
        expected: &'static str,
        actual: MessageType,
    },

    /// An IPC response answered a different call.
    #[error("IPC response call id {actual} does not match call {expected}")]
    CallIdMismatch { expected: u32, actual: u32 },

    /// The server sent a disconnect message.
    #[error("peer disconnected: {0}")]
    PeerDisconnected(String),
}

impl SessionError {
    /// True for transport-layer failures (as opposed to protocol violations).
    pub fn is_transport(&self) -> bool {
        match self {
            SessionError::Transport(_) => true,
            SessionError::Frame(err) => err.is_transport(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
