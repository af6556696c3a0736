use std::io::{Cursor, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::error::Result;

/// Releases the transport once a session is finished with it.
///
/// Closing is idempotent: a second call on an already closed stream must not
/// fail. In-memory streams implement it as a no-op.
pub trait Close {
    /// Release the underlying resource.
    fn close(&mut self) -> std::io::Result<()>;
}

/// A connected PTMP stream. Implements Read + Write.
///
/// This is the fundamental I/O type returned by [`crate::TcpTransport`].
pub struct PtmpStream {
    inner: TcpStream,
    peer: Option<SocketAddr>,
    closed: bool,
}

impl Read for PtmpStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for PtmpStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl PtmpStream {
    /// Wrap an already connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        Self {
            inner: stream,
            peer,
            closed: false,
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable Nagle's algorithm; PTMP exchanges are small request/response pairs.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Used to split one connection into a frame reader and a frame writer.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer: self.peer,
            closed: self.closed,
        })
    }

    /// Address of the remote PTMP server, if known.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Whether [`Close::close`] has been called on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Close for PtmpStream {
    fn close(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer may already have torn the connection down.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Close for TcpStream {
    fn close(&mut self) -> std::io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(unix)]
impl Close for std::os::unix::net::UnixStream {
    fn close(&mut self) -> std::io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Close for Vec<u8> {
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T> Close for Cursor<T> {
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }
}

impl std::fmt::Debug for PtmpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtmpStream")
            .field("type", &"tcp")
            .field("peer", &self.peer)
            .field("closed", &self.closed)
            .finish()
    }
}
