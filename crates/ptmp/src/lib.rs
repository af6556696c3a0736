//! Client for the Packet Tracer Messaging Protocol (PTMP).
//!
//! PTMP is the text-delimited, length-prefixed protocol Packet Tracer speaks
//! on its IPC port. A client negotiates, answers an authentication
//! challenge, then issues IPC calls such as `appWindow.getVersion`.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP byte stream and the `Close` seam
//! - [`frame`]: Frame codec, NUL-terminated fields and typed IPC values
//! - [`session`]: Negotiation, authentication and the call state machine
//!
//! ```no_run
//! use ptmp::session::{
//!     authentication, connect, generate_app_id, AuthenticationResponse, IpcCallInfo,
//!     NegotiationInfo,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = connect("127.0.0.1:39000")?;
//! let negotiation = NegotiationInfo::new(generate_app_id(), authentication::CLEARTEXT);
//! session.handshake(&negotiation, "net.ihitc.ptmptest", |_| {
//!     AuthenticationResponse::new("net.ihitc.ptmptest", "cisco", "")
//! })?;
//! let call_id = session.next_call_id();
//! let version = session.call(&IpcCallInfo::new(call_id, "appWindow.getVersion"))?;
//! println!("{:?}", version.value());
//! session.disconnect("Finished")?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use ptmp_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ptmp_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use ptmp_session::*;
}
