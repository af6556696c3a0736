//! Byte-stream transport for PTMP.
//!
//! PTMP runs over a single TCP connection. This crate provides the connected
//! [`PtmpStream`] (Read + Write), the [`TcpTransport`] connector, and the
//! [`Close`] seam the session layer uses to release a stream on disconnect.
//!
//! This is the lowest layer of ptmp. Framing and sessions build on top of
//! any `Read`/`Write` pair, so tests can substitute in-memory streams.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::{Close, PtmpStream};
pub use tcp::{with_default_port, TcpTransport, DEFAULT_IPC_PORT};
