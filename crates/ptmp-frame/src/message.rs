//! PTMP message type codes.
//!
//! Codes 0-8 are session messages. 100-199 are IPC messages and 200-299 are
//! reserved for multi-user messages.

use std::fmt;

/// Type code carried in the second header field of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    NegotiationRequest,
    NegotiationResponse,
    AuthenticationRequest,
    AuthenticationChallenge,
    AuthenticationResponse,
    AuthenticationStatus,
    KeepAlive,
    Disconnect,
    Communication,
    IpcCall,
    /// Any code without a dedicated variant.
    Other(u32),
}

impl MessageType {
    /// First code of the IPC message range.
    pub const IPC_RANGE_START: u32 = 100;
    /// Last code of the IPC message range.
    pub const IPC_RANGE_END: u32 = 199;
    /// First code of the multi-user message range.
    pub const MULTIUSER_RANGE_START: u32 = 200;
    /// Last code of the multi-user message range.
    pub const MULTIUSER_RANGE_END: u32 = 299;

    /// Wire code for this message type.
    pub fn code(self) -> u32 {
        match self {
            MessageType::NegotiationRequest => 0,
            MessageType::NegotiationResponse => 1,
            MessageType::AuthenticationRequest => 2,
            MessageType::AuthenticationChallenge => 3,
            MessageType::AuthenticationResponse => 4,
            MessageType::AuthenticationStatus => 5,
            MessageType::KeepAlive => 6,
            MessageType::Disconnect => 7,
            MessageType::Communication => 8,
            MessageType::IpcCall => 100,
            MessageType::Other(code) => code,
        }
    }

    /// Map a wire code to its message type.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => MessageType::NegotiationRequest,
            1 => MessageType::NegotiationResponse,
            2 => MessageType::AuthenticationRequest,
            3 => MessageType::AuthenticationChallenge,
            4 => MessageType::AuthenticationResponse,
            5 => MessageType::AuthenticationStatus,
            6 => MessageType::KeepAlive,
            7 => MessageType::Disconnect,
            8 => MessageType::Communication,
            100 => MessageType::IpcCall,
            other => MessageType::Other(other),
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::NegotiationRequest => "NEGOTIATION_REQUEST",
            MessageType::NegotiationResponse => "NEGOTIATION_RESPONSE",
            MessageType::AuthenticationRequest => "AUTHENTICATION_REQUEST",
            MessageType::AuthenticationChallenge => "AUTHENTICATION_CHALLENGE",
            MessageType::AuthenticationResponse => "AUTHENTICATION_RESPONSE",
            MessageType::AuthenticationStatus => "AUTHENTICATION_STATUS",
            MessageType::KeepAlive => "KEEP_ALIVE",
            MessageType::Disconnect => "DISCONNECT",
            MessageType::Communication => "COMMUNICATION",
            MessageType::IpcCall => "IPC_CALL",
            MessageType::Other(code) if Self::is_ipc_code(code) => "IPC",
            MessageType::Other(code) if Self::is_multiuser_code(code) => "MULTIUSER",
            MessageType::Other(_) => "UNKNOWN",
        }
    }

    /// Returns true if the code falls in the IPC range (100-199).
    pub fn is_ipc(self) -> bool {
        Self::is_ipc_code(self.code())
    }

    /// Returns true if the code falls in the multi-user range (200-299).
    pub fn is_multiuser(self) -> bool {
        Self::is_multiuser_code(self.code())
    }

    fn is_ipc_code(code: u32) -> bool {
        (Self::IPC_RANGE_START..=Self::IPC_RANGE_END).contains(&code)
    }

    fn is_multiuser_code(code: u32) -> bool {
        (Self::MULTIUSER_RANGE_START..=Self::MULTIUSER_RANGE_END).contains(&code)
    }
}

impl From<u32> for MessageType {
    fn from(code: u32) -> Self {
        MessageType::from_code(code)
    }
}

impl From<MessageType> for u32 {
    fn from(msg_type: MessageType) -> Self {
        msg_type.code()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
