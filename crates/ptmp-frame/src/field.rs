//! NUL-terminated body fields.

use std::fmt::Display;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Terminator after every field, including the last one in a body.
pub const FIELD_TERMINATOR: u8 = 0;

/// Append `value` followed by the field terminator.
///
/// Callers must not embed NUL in `value`; it would split the field and
/// corrupt every field after it.
pub fn write_field(value: &str, dst: &mut BytesMut) {
    debug_assert!(
        !value.as_bytes().contains(&FIELD_TERMINATOR),
        "PTMP field values must not contain NUL"
    );
    dst.reserve(value.len() + 1);
    dst.put_slice(value.as_bytes());
    dst.put_u8(FIELD_TERMINATOR);
}

/// Builds a frame body one field at a time.
#[derive(Debug, Default, Clone)]
pub struct BodyBuilder {
    buf: BytesMut,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn field(&mut self, value: &str) -> &mut Self {
        write_field(value, &mut self.buf);
        self
    }

    /// Append a decimal integer field.
    pub fn int(&mut self, value: impl Display) -> &mut Self {
        write_field(&value.to_string(), &mut self.buf);
        self
    }

    /// Append a `true`/`false` field.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        write_field(if value { "true" } else { "false" }, &mut self.buf);
        self
    }

    /// Mutable access to the raw buffer, for value encoders.
    pub fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the body.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads fields from a frame body, bounded to that body.
///
/// Tracks how many bytes have been consumed so parsers can compare against
/// the frame's declared length.
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far, terminators included.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Bytes left in the body.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte of the body has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip whatever is left of the body.
    pub fn skip_rest(&mut self) {
        self.pos = self.buf.len();
    }

    /// Read the raw bytes of the next field, terminator stripped.
    ///
    /// On failure nothing is consumed.
    pub fn read_raw(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == FIELD_TERMINATOR)
            .ok_or(FrameError::UnexpectedEndOfStream { field })?;
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// Read the next field as UTF-8 text.
    pub fn read_str(&mut self, field: &'static str) -> Result<String> {
        let start = self.pos;
        let raw = self.read_raw(field)?;
        match std::str::from_utf8(raw) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                self.pos = start;
                Err(FrameError::InvalidFieldValue {
                    field,
                    value: String::from_utf8_lossy(raw).into_owned(),
                })
            }
        }
    }

    /// Read the next field as a decimal integer (or any `FromStr` number).
    pub fn read_int<T: FromStr>(&mut self, field: &'static str) -> Result<T> {
        let start = self.pos;
        let text = self.read_str(field)?;
        text.trim().parse::<T>().map_err(|_| {
            self.pos = start;
            FrameError::InvalidFieldValue { field, value: text }
        })
    }

    /// Read the next field as a boolean.
    ///
    /// An empty field reads as `false` instead of failing; some servers send
    /// an empty status field.
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool> {
        let start = self.pos;
        let text = self.read_str(field)?;
        if text.is_empty() {
            return Ok(false);
        }
        parse_bool(&text).ok_or_else(|| {
            self.pos = start;
            FrameError::InvalidFieldValue { field, value: text }
        })
    }
}

/// Accepts the same spellings PTMP servers and clients emit for booleans.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_writes_terminated_fields() {
        let mut body = BodyBuilder::new();
        body.field("PTMP").int(1).bool(true).bool(false).field("");
        assert_eq!(body.finish().as_ref(), b"PTMP\01\0true\0false\0\0");
    }

    #[test]
    fn read_fields_in_order() {
        let mut cursor = FieldCursor::new(b"u\0p\0\0");
        assert_eq!(cursor.read_str("username").unwrap(), "u");
        assert_eq!(cursor.read_str("digest").unwrap(), "p");
        assert_eq!(cursor.read_str("custom").unwrap(), "");
        assert!(cursor.is_empty());
        assert_eq!(cursor.consumed(), 5);
    }

    #[test]
    fn missing_terminator_is_end_of_stream() {
        let mut cursor = FieldCursor::new(b"abc");
        let err = cursor.read_str("challenge").unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnexpectedEndOfStream { field: "challenge" }
        ));
        assert_eq!(cursor.consumed(), 0);
    }

    #[test]
    fn read_int_parses_and_rejects() {
        let mut cursor = FieldCursor::new(b"42\0-7\0x1\0");
        assert_eq!(cursor.read_int::<u32>("call id").unwrap(), 42);
        assert_eq!(cursor.read_int::<i32>("value").unwrap(), -7);
        let err = cursor.read_int::<i32>("version").unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidFieldValue { field: "version", ref value } if value == "x1"
        ));
        // Failed reads leave the cursor where it was.
        assert_eq!(cursor.consumed(), 6);
    }

    #[test]
    fn read_bool_accepts_common_spellings() {
        let mut cursor = FieldCursor::new(b"true\0False\01\00\0");
        assert!(cursor.read_bool("a").unwrap());
        assert!(!cursor.read_bool("b").unwrap());
        assert!(cursor.read_bool("c").unwrap());
        assert!(!cursor.read_bool("d").unwrap());
    }

    #[test]
    fn read_bool_empty_field_is_false() {
        let mut cursor = FieldCursor::new(b"\0");
        assert!(!cursor.read_bool("status").unwrap());
        assert!(cursor.is_empty());
    }

    #[test]
    fn read_bool_rejects_garbage() {
        let mut cursor = FieldCursor::new(b"maybe\0");
        assert!(matches!(
            cursor.read_bool("status"),
            Err(FrameError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn read_bool_without_terminator_still_fails() {
        let mut cursor = FieldCursor::new(b"");
        assert!(matches!(
            cursor.read_bool("status"),
            Err(FrameError::UnexpectedEndOfStream { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut cursor = FieldCursor::new(b"\xff\xfe\0");
        assert!(matches!(
            cursor.read_str("name"),
            Err(FrameError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn skip_rest_consumes_everything() {
        let mut cursor = FieldCursor::new(b"a\0b\0");
        cursor.read_raw("a").unwrap();
        cursor.skip_rest();
        assert!(cursor.is_empty());
        assert_eq!(cursor.consumed(), 4);
    }
}
