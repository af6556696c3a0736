//! `tokio_util::codec` adapter for PTMP frames.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, DEFAULT_MAX_FRAME_LENGTH};
use crate::error::{FrameError, Result};

/// Frame codec for use with `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone)]
pub struct PtmpCodec {
    max_frame_length: usize,
}

impl PtmpCodec {
    pub fn new() -> Self {
        Self::with_max_frame_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self { max_frame_length }
    }
}

impl Default for PtmpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PtmpCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.max_frame_length)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::TruncatedFrame {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<Frame> for PtmpCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let length = item.length;
        if length > self.max_frame_length {
            return Err(FrameError::FrameTooLarge {
                size: length,
                max: self.max_frame_length,
            });
        }
        encode_frame(item.msg_type, &item.body, dst);
        Ok(())
    }
}
