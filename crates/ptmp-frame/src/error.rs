/// Errors that can occur during frame encoding/decoding.
///
/// Everything except [`FrameError::Io`] is a protocol-layer failure; `Io`
/// carries transport errors through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended after some, but not all, of a frame arrived.
    #[error("truncated frame ({buffered} bytes buffered at end of stream)")]
    TruncatedFrame { buffered: usize },

    /// A header field (`length` or `type`) is not a decimal integer.
    #[error("malformed {field} header: {value:?}")]
    MalformedInteger { field: &'static str, value: String },

    /// A body field could not be parsed as the expected kind of value.
    #[error("invalid value for {field}: {value:?}")]
    InvalidFieldValue { field: &'static str, value: String },

    /// A body field has no NUL terminator before the end of the frame body.
    #[error("unexpected end of frame body while reading {field}")]
    UnexpectedEndOfStream { field: &'static str },

    /// The declared frame length disagrees with the bytes actually present.
    #[error("frame length mismatch (declared {declared}, actual {actual})")]
    FrameLengthMismatch { declared: usize, actual: usize },

    /// The value type tag has no decoder (PAIR, DATA, or an unknown tag).
    #[error("unsupported value type tag {0}")]
    UnsupportedType(u32),

    /// The declared frame length exceeds the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed cleanly between frames.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True for transport-layer failures (as opposed to protocol violations).
    pub fn is_transport(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
