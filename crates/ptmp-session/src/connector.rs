use ptmp_frame::{FrameReader, FrameWriter};
use ptmp_transport::{PtmpStream, TcpTransport};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::Session;

/// A session over a TCP connection.
pub type TcpSession = Session<PtmpStream, PtmpStream>;

/// Connect to a PTMP server with default configuration.
///
/// `addr` is `host:port`; a bare host uses the default IPC port.
pub fn connect(addr: &str) -> Result<TcpSession> {
    connect_with_config(addr, &SessionConfig::default())
}

/// Connect with explicit configuration.
///
/// The session starts in the disconnected state; negotiation is up to the
/// caller (see [`Session::handshake`]).
pub fn connect_with_config(addr: &str, config: &SessionConfig) -> Result<TcpSession> {
    let stream = match config.timeout {
        Some(timeout) => TcpTransport::connect_timeout(addr, timeout)?,
        None => TcpTransport::connect(addr)?,
    };
    connect_with_stream(stream, config)
}

/// Build a session over an already connected stream.
pub fn connect_with_stream(stream: PtmpStream, config: &SessionConfig) -> Result<TcpSession> {
    let reader_stream = stream.try_clone()?;
    let frame_config = config.frame_config();

    let mut reader = FrameReader::with_config_tcp(reader_stream, frame_config.clone())?;
    let mut writer = FrameWriter::with_config_tcp(stream, frame_config)?;
    if let Some(observer) = &config.observer {
        reader = reader.with_observer(observer.clone());
        writer = writer.with_observer(observer.clone());
    }

    Ok(Session::new(reader, writer, config.clone()))
}
