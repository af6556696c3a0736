//! PTMP client sessions.
//!
//! A session walks one connection through the fixed PTMP sequence:
//!
//! ```text
//! negotiation request/response
//!   → authentication request → challenge → response → status
//!     → IPC call / response (repeated, one at a time)
//!       → disconnect
//! ```
//!
//! Out-of-order operations fail with [`SessionError::InvalidState`] before
//! anything is written to the wire.

pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod ipc;
pub mod negotiation;
pub mod session;
pub mod state;

pub use auth::{
    AuthenticationChallenge, AuthenticationRequest, AuthenticationResponse, AuthenticationStatus,
    Disconnect,
};
pub use config::SessionConfig;
pub use connector::{connect, connect_with_config, connect_with_stream, TcpSession};
pub use error::{Result, SessionError};
pub use ipc::{IpcCallInfo, IpcCallResponseInfo, SEGMENT_MARKER};
pub use negotiation::{
    authentication, compression, current_timestamp, encoding, encryption, generate_app_id,
    NegotiationInfo, DEFAULT_KEEP_ALIVE_PERIOD, DEFAULT_RESERVED, PTMP_IDENTIFIER, PTMP_VERSION,
};
pub use session::Session;
pub use state::{Phase, SessionState};
