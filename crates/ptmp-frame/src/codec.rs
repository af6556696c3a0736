use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::field::FieldCursor;
use crate::message::MessageType;

/// Default maximum declared frame length: 16 MiB.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Longest header field accepted before its terminator (fits any `u64`).
const MAX_HEADER_DIGITS: usize = 20;

/// How strictly declared lengths are enforced while parsing frame bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    /// The body must be consumed exactly; any shortfall or overrun is an error.
    Strict,
    /// Stop quietly at the end of the available bytes. Tolerates servers whose
    /// declared lengths do not line up with what they send.
    #[default]
    Lenient,
}

/// A decoded PTMP frame.
///
/// `length` is the declared wire length: the byte length of the `type` field
/// (digits + NUL) plus the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Declared length from the header.
    pub length: usize,
    /// Message type from the header.
    pub msg_type: MessageType,
    /// Body bytes.
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame, computing `length` from the type and body.
    pub fn new(msg_type: MessageType, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            length: type_field_len(msg_type) + body.len(),
            msg_type,
            body,
        }
    }

    /// Body length implied by the declared `length`.
    pub fn declared_body_len(&self) -> usize {
        self.length.saturating_sub(type_field_len(self.msg_type))
    }

    /// False when the body is shorter than declared (lenient end-of-stream).
    pub fn is_complete(&self) -> bool {
        self.body.len() == self.declared_body_len()
    }

    /// Cursor over the body fields.
    pub fn fields(&self) -> FieldCursor<'_> {
        FieldCursor::new(&self.body)
    }

    /// The total wire size of this frame (length field + type field + body).
    pub fn wire_size(&self) -> usize {
        decimal_len(self.length) + 1 + self.length
    }
}

/// Byte length of the encoded `type` field, terminator included.
pub fn type_field_len(msg_type: MessageType) -> usize {
    decimal_len(msg_type.code() as usize) + 1
}

fn decimal_len(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────┬──────────────────────────┐
/// │ length  NUL  │ type  NUL  │ body (NUL-terminated     │
/// │ (decimal)    │ (decimal)  │  fields)                 │
/// └──────────────┴────────────┴──────────────────────────┘
///                 └──────────── length bytes ────────────┘
/// ```
pub fn encode_frame(msg_type: MessageType, body: &[u8], dst: &mut BytesMut) {
    let type_field = msg_type.code().to_string();
    let length = type_field.len() + 1 + body.len();
    let length_field = length.to_string();

    dst.reserve(length_field.len() + 1 + length);
    dst.put_slice(length_field.as_bytes());
    dst.put_u8(0);
    dst.put_slice(type_field.as_bytes());
    dst.put_u8(0);
    dst.put_slice(body);
}

/// Decode a frame from a buffer.
///
/// Header fields are read in the canonical order `length` then `type`.
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_length: usize) -> Result<Option<Frame>> {
    let Some(header) = parse_header(src, max_length)? else {
        return Ok(None); // Need more data
    };

    if src.len() < header.header_len + header.body_len {
        return Ok(None); // Need more data
    }

    src.advance(header.header_len);
    let body = src.split_to(header.body_len).freeze();

    Ok(Some(Frame {
        length: header.length,
        msg_type: header.msg_type,
        body,
    }))
}

/// Decode whatever is buffered once the stream has ended.
///
/// If the header is complete, returns the frame with the body bytes that did
/// arrive (possibly fewer than declared) and drains the buffer. Returns
/// `Ok(None)` if not even the header arrived.
pub fn decode_partial_frame(src: &mut BytesMut, max_length: usize) -> Result<Option<Frame>> {
    let Some(header) = parse_header(src, max_length)? else {
        return Ok(None);
    };

    src.advance(header.header_len);
    let available = src.len().min(header.body_len);
    let body = src.split_to(available).freeze();

    Ok(Some(Frame {
        length: header.length,
        msg_type: header.msg_type,
        body,
    }))
}

struct Header {
    length: usize,
    msg_type: MessageType,
    header_len: usize,
    body_len: usize,
}

fn parse_header(src: &[u8], max_length: usize) -> Result<Option<Header>> {
    let Some((length, length_field_len)) = parse_header_field(src, "length")? else {
        return Ok(None);
    };

    if length > max_length {
        return Err(FrameError::FrameTooLarge {
            size: length,
            max: max_length,
        });
    }

    let Some((code, type_len)) = parse_header_field(&src[length_field_len..], "type")? else {
        return Ok(None);
    };

    let code = u32::try_from(code).map_err(|_| FrameError::MalformedInteger {
        field: "type",
        value: code.to_string(),
    })?;

    // The declared length always covers the type field. Anything shorter means
    // the header fields are not in (length, type) order or are corrupt.
    if length < type_len {
        return Err(FrameError::FrameLengthMismatch {
            declared: length,
            actual: type_len,
        });
    }

    Ok(Some(Header {
        length,
        msg_type: MessageType::from_code(code),
        header_len: length_field_len + type_len,
        body_len: length - type_len,
    }))
}

/// Parse one NUL-terminated decimal header field.
///
/// Returns the value and the field's byte length including the terminator,
/// or `None` if the terminator has not arrived yet.
fn parse_header_field(src: &[u8], field: &'static str) -> Result<Option<(usize, usize)>> {
    let scan = &src[..src.len().min(MAX_HEADER_DIGITS + 1)];
    let terminator = scan.iter().position(|&b| b == 0);
    let digits = &scan[..terminator.unwrap_or(scan.len())];

    if digits.iter().any(|b| !b.is_ascii_digit()) {
        return Err(malformed(field, digits));
    }

    let Some(end) = terminator else {
        if digits.len() > MAX_HEADER_DIGITS {
            return Err(malformed(field, digits));
        }
        return Ok(None);
    };

    if digits.is_empty() {
        return Err(malformed(field, digits));
    }

    let value = std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| malformed(field, digits))?;

    Ok(Some((value, end + 1)))
}

fn malformed(field: &'static str, digits: &[u8]) -> FrameError {
    FrameError::MalformedInteger {
        field,
        value: String::from_utf8_lossy(digits).into_owned(),
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum declared frame length in bytes. Default: 16 MiB.
    pub max_frame_length: usize,
    /// Behavior when the stream ends inside a frame body.
    pub length_mode: LengthMode,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            length_mode: LengthMode::default(),
            read_timeout: None,
            write_timeout: None,
        }
    }
}
