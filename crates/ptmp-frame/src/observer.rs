//! Hooks for watching frames go by.
//!
//! Readers and writers report every frame they move, and every failure, to a
//! [`FrameObserver`]. The default [`TracingObserver`] turns those into
//! `tracing` events; the codec itself never logs.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::codec::Frame;
use crate::error::FrameError;
use crate::message::MessageType;

/// Receives notifications from [`crate::FrameReader`] and [`crate::FrameWriter`].
pub trait FrameObserver: Send + Sync {
    /// A frame was fully written. `wire_len` counts every byte sent.
    fn frame_sent(&self, _msg_type: MessageType, _body: &[u8], _wire_len: usize) {}

    /// A frame was decoded from the stream.
    fn frame_received(&self, _frame: &Frame) {}

    /// Reading or writing failed.
    fn frame_error(&self, _err: &FrameError) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {}

/// Emits `tracing` events at debug level, with the body at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FrameObserver for TracingObserver {
    fn frame_sent(&self, msg_type: MessageType, body: &[u8], wire_len: usize) {
        debug!(msg_type = %msg_type, bytes = wire_len, "frame sent");
        trace!(body = %escape_nul(body), "sent body");
    }

    fn frame_received(&self, frame: &Frame) {
        debug!(
            msg_type = %frame.msg_type,
            length = frame.length,
            complete = frame.is_complete(),
            "frame received"
        );
        trace!(body = %escape_nul(&frame.body), "received body");
    }

    fn frame_error(&self, err: &FrameError) {
        warn!(error = %err, "frame error");
    }
}

pub(crate) fn default_observer() -> Arc<dyn FrameObserver> {
    Arc::new(TracingObserver)
}

/// Render bytes as text with NUL shown as `\x00`.
pub fn escape_nul(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 8);
    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            if ch == '\0' {
                out.push_str("\\x00");
            } else {
                out.push(ch);
            }
        }
        for byte in chunk.invalid() {
            out.push_str(&format!("\\x{byte:02x}"));
        }
    }
    out
}
