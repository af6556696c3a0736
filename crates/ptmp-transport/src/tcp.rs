use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::PtmpStream;

/// Default TCP port a PTMP server (Packet Tracer IPC) listens on.
pub const DEFAULT_IPC_PORT: u16 = 39000;

/// TCP transport for PTMP.
///
/// Connects to `host:port`; a bare host gets [`DEFAULT_IPC_PORT`].
pub struct TcpTransport;

impl TcpTransport {
    /// Connect to a PTMP server (blocking, OS default connect timeout).
    pub fn connect(addr: &str) -> Result<PtmpStream> {
        let target = with_default_port(addr);
        let stream = TcpStream::connect(target.as_str()).map_err(|e| TransportError::Connect {
            addr: target.clone(),
            source: e,
        })?;
        Self::finish(stream, &target)
    }

    /// Connect with an explicit timeout applied to every resolved address.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<PtmpStream> {
        let target = with_default_port(addr);
        let candidates = resolve(&target)?;

        let mut last_err = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => return Self::finish(stream, &target),
                Err(err) => {
                    debug!(%candidate, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            addr: target,
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "tcp"
    }

    fn finish(stream: TcpStream, target: &str) -> Result<PtmpStream> {
        let stream = PtmpStream::from_tcp(stream);
        stream.set_nodelay(true)?;
        info!(addr = %target, "connected to PTMP server");
        Ok(stream)
    }
}

fn resolve(target: &str) -> Result<Vec<SocketAddr>> {
    target
        .to_socket_addrs()
        .map(Iterator::collect)
        .map_err(|e| TransportError::Resolve {
            addr: target.to_string(),
            source: e,
        })
}

/// Append [`DEFAULT_IPC_PORT`] when `addr` carries no port.
pub fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    // Bracketed IPv6 without a port, or a bare IPv6 literal.
    if addr.starts_with('[') && addr.ends_with(']') {
        return format!("{addr}:{DEFAULT_IPC_PORT}");
    }
    if addr.parse::<std::net::Ipv6Addr>().is_ok() {
        return format!("[{addr}]:{DEFAULT_IPC_PORT}");
    }
    match addr.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => addr.to_string(),
        _ => format!("{addr}:{DEFAULT_IPC_PORT}"),
    }
}
