use std::io::{ErrorKind, Write};
use std::sync::Arc;

use bytes::BytesMut;
use ptmp_transport::{Close, PtmpStream};

use crate::codec::{encode_frame, type_field_len, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::MessageType;
use crate::observer::{default_observer, FrameObserver};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    observer: Arc<dyn FrameObserver>,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
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

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send(frame.msg_type, frame.body.as_ref())
    }

    /// Encode and send a body as one frame. Returns the bytes written.
    pub fn send(&mut self, msg_type: MessageType, body: &[u8]) -> Result<usize> {
        match self.send_inner(msg_type, body) {
            Ok(written) => {
                self.observer.frame_sent(msg_type, body, written);
                Ok(written)
            }
            Err(err) => {
                self.observer.frame_error(&err);
                Err(err)
            }
        }
    }

    fn send_inner(&mut self, msg_type: MessageType, body: &[u8]) -> Result<usize> {
        let length = type_field_len(msg_type) + body.len();
        if length > self.config.max_frame_length {
            return Err(FrameError::FrameTooLarge {
                size: length,
                max: self.config.max_frame_length,
            });
        }

        self.buf.clear();
        encode_frame(msg_type, body, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        Ok(offset)
    }

    /// Flush the underlying stream.
    ///
    /// A write timeout surfaces as `WouldBlock` or `TimedOut` and is returned
    /// as [`FrameError::Io`].
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame length for subsequent frame encoding.
    pub fn set_max_frame_length(&mut self, max_frame_length: usize) {
        self.config.max_frame_length = max_frame_length;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Write + Close> FrameWriter<T> {
    /// Flush and release the underlying stream.
    pub fn close(&mut self) -> Result<()> {
        let flushed = self.flush();
        self.inner.close()?;
        flushed
    }
}

impl FrameWriter<PtmpStream> {
    /// Create a frame writer for `PtmpStream` and apply write timeout from config.
    pub fn with_config_tcp(inner: PtmpStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
