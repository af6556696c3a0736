use std::fmt;

use serde::Serialize;

/// Where a session is in the PTMP sequence.
///
/// Each request/response pair has a "sent, waiting" state so that a response
/// cannot be read before its request was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connected, nothing exchanged yet.
    Disconnected,
    /// Negotiation request sent.
    Negotiating,
    /// Negotiation response accepted; authentication may start.
    Negotiated,
    /// Authentication request sent.
    AwaitingChallenge,
    /// Challenge received; the response may be sent.
    Challenged,
    /// Authentication response sent.
    AwaitingStatus,
    /// Authenticated; IPC calls may be issued.
    Ready,
    /// IPC call sent; its response has not been read yet.
    AwaitingReturn,
    /// The server rejected authentication. Only disconnect is allowed.
    Rejected,
    /// Disconnected by either side. Terminal.
    Closed,
}

/// Coarse phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Disconnected,
    Negotiating,
    Authenticating,
    Ready,
    Closed,
}

impl SessionState {
    pub fn phase(self) -> Phase {
        match self {
            SessionState::Disconnected => Phase::Disconnected,
            SessionState::Negotiating => Phase::Negotiating,
            SessionState::Negotiated
            | SessionState::AwaitingChallenge
            | SessionState::Challenged
            | SessionState::AwaitingStatus
            | SessionState::Rejected => Phase::Authenticating,
            SessionState::Ready | SessionState::AwaitingReturn => Phase::Ready,
            SessionState::Closed => Phase::Closed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Negotiating => "negotiating",
            SessionState::Negotiated => "negotiated",
            SessionState::AwaitingChallenge => "awaiting-challenge",
            SessionState::Challenged => "challenged",
            SessionState::AwaitingStatus => "awaiting-status",
            SessionState::Ready => "ready",
            SessionState::AwaitingReturn => "awaiting-return",
            SessionState::Rejected => "rejected",
            SessionState::Closed => "closed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
