use std::io::{ErrorKind, Read};
use std::sync::Arc;

use bytes::BytesMut;
use ptmp_transport::PtmpStream;

use crate::codec::{decode_frame, decode_partial_frame, Frame, FrameConfig, LengthMode};
use crate::error::{FrameError, Result};
use crate::observer::{default_observer, FrameObserver};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames
/// (or, in [`LengthMode::Lenient`], whatever body arrived before EOF).
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    observer: Arc<dyn FrameObserver>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            observer: default_observer(),
        }
    }

    /// Replace the frame observer.
    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached between
    /// frames and `Err(FrameError::TruncatedFrame)` when it is reached inside one.
    pub fn read_frame(&mut self) -> Result<Frame> {
        match self.next_frame() {
            Ok(frame) => {
                self.observer.frame_received(&frame);
                Ok(frame)
            }
            Err(err) => {
                self.observer.frame_error(&err);
                Err(err)
            }
        }
    }

    fn next_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_frame_length)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return self.end_of_stream();
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn end_of_stream(&mut self) -> Result<Frame> {
        if self.buf.is_empty() {
            return Err(FrameError::ConnectionClosed);
        }

        let buffered = self.buf.len();
        if self.config.length_mode == LengthMode::Lenient {
            if let Some(frame) = decode_partial_frame(&mut self.buf, self.config.max_frame_length)?
            {
                tracing::warn!(
                    declared = frame.declared_body_len(),
                    received = frame.body.len(),
                    "stream ended inside frame body; keeping partial body"
                );
                return Ok(frame);
            }
        }

        Err(FrameError::TruncatedFrame { buffered })
    }

    /// Bytes read from the stream but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame length for subsequent frame decoding.
    pub fn set_max_frame_length(&mut self, max_frame_length: usize) {
        self.config.max_frame_length = max_frame_length;
    }

    /// Switch between strict and lenient end-of-stream handling.
    pub fn set_length_mode(&mut self, length_mode: LengthMode) {
        self.config.length_mode = length_mode;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<PtmpStream> {
    /// Create a frame reader for `PtmpStream` and apply read timeout from config.
    pub fn with_config_tcp(inner: PtmpStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: ptmp_transport::TransportError) -> FrameError {
    match err {
        ptmp_transport::TransportError::Io(io) => FrameError::Io(io),
        ptmp_transport::TransportError::Resolve { source, .. }
        | ptmp_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        ptmp_transport::TransportError::Shutdown => FrameError::ConnectionClosed,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::message::MessageType;

    fn wire(frames: &[(MessageType, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (msg_type, body) in frames {
            encode_frame(*msg_type, body, &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[(MessageType::AuthenticationChallenge, b"abc123\0")]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.msg_type, MessageType::AuthenticationChallenge);
        assert_eq!(frame.body.as_ref(), b"abc123\0");
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = wire(&[
            (MessageType::NegotiationResponse, b"PTMP\0"),
            (MessageType::AuthenticationChallenge, b"abc\0"),
            (MessageType::AuthenticationStatus, b"true\0"),
        ]);

        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(f1.msg_type, MessageType::NegotiationResponse);
        assert_eq!(f2.body.as_ref(), b"abc\0");
        assert_eq!(f3.msg_type, MessageType::AuthenticationStatus);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn read_frame_with_large_body() {
        let mut body = "x".repeat(64 * 1024).into_bytes();
        body.push(0);
        let bytes = wire(&[(MessageType::IpcCall, &body)]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.body.len(), body.len());
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[(MessageType::Disconnect, b"Finished\0")]);

        let byte_reader = ByteByByteReader { bytes, pos: 0 };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.msg_type, MessageType::Disconnect);
        assert_eq!(frame.body.as_ref(), b"Finished\0");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_header() {
        let mut reader = FrameReader::new(Cursor::new(b"12\0".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::TruncatedFrame { buffered: 3 }));
    }

    #[test]
    fn strict_mode_rejects_short_body() {
        let mut bytes = wire(&[(MessageType::IpcCall, b"1\09\0hello\0")]);
        bytes.truncate(bytes.len() - 3);

        let cfg = FrameConfig {
            length_mode: LengthMode::Strict,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::TruncatedFrame { .. }));
    }

    #[test]
    fn lenient_mode_keeps_short_body() {
        let mut bytes = wire(&[(MessageType::IpcCall, b"1\09\0hello\0")]);
        bytes.truncate(bytes.len() - 3);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.body.as_ref(), b"1\09\0hel");
        assert!(!frame.is_complete());

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn malformed_header_in_stream() {
        let mut reader = FrameReader::new(Cursor::new(b"PTMP\0".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::MalformedInteger { .. }));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let cfg = FrameConfig {
            max_frame_length: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(b"1024\0100\0".to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
    }

    #[test]
    fn observer_sees_frames_and_errors() {
        #[derive(Default)]
        struct Counting {
            received: Mutex<usize>,
            errors: Mutex<usize>,
        }
        impl FrameObserver for Counting {
            fn frame_received(&self, _frame: &Frame) {
                *self.received.lock().unwrap() += 1;
            }
            fn frame_error(&self, _err: &FrameError) {
                *self.errors.lock().unwrap() += 1;
            }
        }

        let observer = Arc::new(Counting::default());
        let bytes = wire(&[(MessageType::KeepAlive, b"")]);
        let mut reader = FrameReader::new(Cursor::new(bytes)).with_observer(observer.clone());

        reader.read_frame().unwrap();
        reader.read_frame().unwrap_err();

        assert_eq!(*observer.received.lock().unwrap(), 1);
        assert_eq!(*observer.errors.lock().unwrap(), 1);
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            if buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(MessageType::KeepAlive, b"").unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.msg_type, MessageType::KeepAlive);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        reader.set_max_frame_length(64);
        reader.set_length_mode(LengthMode::Strict);
        assert_eq!(reader.config().max_frame_length, 64);
        let _inner = reader.into_inner();
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let bytes = wire(&[(MessageType::KeepAlive, b"")]);

        let reader = FailFirst {
            kind: ErrorKind::WouldBlock,
            failed: false,
            bytes,
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[(MessageType::KeepAlive, b"")]);

        let reader = FailFirst {
            kind: ErrorKind::Interrupted,
            failed: false,
            bytes,
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.msg_type, MessageType::KeepAlive);
    }

    struct FailFirst {
        kind: ErrorKind,
        failed: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for FailFirst {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(std::io::Error::from(self.kind));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn applies_read_timeout_for_tcp_stream() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let stream = ptmp_transport::TcpTransport::connect(&addr).unwrap();
        let _server = listener.accept().unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config_tcp(stream, cfg).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut
        ));
    }
}
