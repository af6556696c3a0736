//! IPC call and response bodies.
//!
//! A call body is the call id, the dotted call name split into segments, the
//! typed arguments and a closing marker:
//!
//! ```text
//! callId \0 seg1 \0 " 0 " \0 seg2 \0 ... segN \0 [typeId \0 value \0]* " 0 " \0
//! ```
//!
//! A response body is the call id followed by zero or more `typeId, value`
//! pairs, bounded by the frame's declared length.

use bytes::{Bytes, BytesMut};
use ptmp_frame::{write_field, FieldCursor, Frame, FrameError, IpcData, LengthMode, TypeTag};
use tracing::warn;

use crate::error::Result;

/// Field written after every call name segment except the last, and once
/// more after the arguments.
pub const SEGMENT_MARKER: &str = " 0 ";

/// An IPC call: `appWindow.getActiveWorkspace.getLogicalWorkspace` plus
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct IpcCallInfo {
    pub call_id: u32,
    pub call_name: String,
    pub args: Vec<IpcData>,
}

impl IpcCallInfo {
    pub fn new(call_id: u32, call_name: impl Into<String>) -> Self {
        Self {
            call_id,
            call_name: call_name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: IpcData) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = IpcData>) -> Self {
        self.args.extend(args);
        self
    }

    /// Call name segments, split on `.`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.call_name.split('.')
    }

    pub fn encode_body(&self) -> Result<Bytes> {
        if self.segments().any(str::is_empty) {
            return Err(FrameError::InvalidFieldValue {
                field: "call name",
                value: self.call_name.clone(),
            }
            .into());
        }

        let mut body = BytesMut::new();
        write_field(&self.call_id.to_string(), &mut body);
        let mut segments = self.segments().peekable();
        while let Some(segment) = segments.next() {
            write_field(segment, &mut body);
            if segments.peek().is_some() {
                write_field(SEGMENT_MARKER, &mut body);
            }
        }
        for arg in &self.args {
            arg.encode(&mut body)?;
        }
        write_field(SEGMENT_MARKER, &mut body);
        Ok(body.freeze())
    }

    /// Parse a call body, as a server would.
    ///
    /// After the last segment comes either the closing marker or the first
    /// argument's numeric type id; segment names are never numeric.
    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        let call_id = cursor.read_int("ipc call id")?;
        let mut segments = Vec::new();
        let mut args = Vec::new();

        loop {
            segments.push(cursor.read_str("call name segment")?);
            let next = cursor.read_str("call name marker")?;
            if next == SEGMENT_MARKER {
                if cursor.is_empty() {
                    break;
                }
                continue;
            }

            let mut type_id = next;
            loop {
                let code: u32 = type_id.trim().parse().map_err(|_| {
                    FrameError::InvalidFieldValue {
                        field: "type id",
                        value: type_id.clone(),
                    }
                })?;
                args.push(IpcData::decode_value(TypeTag::try_from(code)?, &mut cursor)?);
                type_id = cursor.read_str("type id")?;
                if type_id == SEGMENT_MARKER {
                    break;
                }
            }
            break;
        }

        Ok(Self {
            call_id,
            call_name: segments.join("."),
            args,
        })
    }
}

/// The answer to an IPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct IpcCallResponseInfo {
    pub call_id: u32,
    pub rets: Vec<IpcData>,
}

impl IpcCallResponseInfo {
    pub fn new(call_id: u32, rets: Vec<IpcData>) -> Self {
        Self { call_id, rets }
    }

    /// First return value, if any.
    pub fn value(&self) -> Option<&IpcData> {
        self.rets.first()
    }

    pub fn encode_body(&self) -> Result<Bytes> {
        let mut body = BytesMut::new();
        write_field(&self.call_id.to_string(), &mut body);
        for ret in &self.rets {
            ret.encode(&mut body)?;
        }
        Ok(body.freeze())
    }

    /// Parse a response body, never reading past the declared length.
    ///
    /// [`LengthMode::Strict`] fails with `FrameLengthMismatch` when the body
    /// ends before the declared length or a value runs past it.
    /// [`LengthMode::Lenient`] returns whatever values were complete.
    pub fn decode(frame: &Frame, mode: LengthMode) -> Result<Self> {
        let declared = frame.declared_body_len();
        let mut cursor = frame.fields();
        let call_id = cursor.read_int("ipc call id")?;
        let mut rets = Vec::new();

        while cursor.consumed() < declared {
            if cursor.is_empty() {
                // Body shorter than declared.
                if mode == LengthMode::Strict {
                    return Err(length_mismatch(declared, &cursor));
                }
                warn!(
                    declared,
                    received = cursor.consumed(),
                    "IPC response shorter than declared length"
                );
                break;
            }
            match IpcData::decode(&mut cursor) {
                Ok(value) => rets.push(value),
                Err(FrameError::UnexpectedEndOfStream { field }) => {
                    if mode == LengthMode::Strict {
                        return Err(length_mismatch(declared, &cursor));
                    }
                    warn!(
                        field,
                        returned = rets.len(),
                        "IPC response ended inside a value; keeping complete values"
                    );
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self { call_id, rets })
    }
}

fn length_mismatch(declared: usize, cursor: &FieldCursor<'_>) -> crate::error::SessionError {
    FrameError::FrameLengthMismatch {
        declared,
        actual: cursor.consumed() + cursor.remaining(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use ptmp_frame::MessageType;

    use super::*;

    fn fields(body: &[u8]) -> Vec<String> {
        let mut out: Vec<String> = body
            .split(|&b| b == 0)
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        // Every field is terminated, so the split leaves an empty tail.
        assert_eq!(out.pop().as_deref(), Some(""));
        out
    }

    #[test]
    fn single_segment_call() {
        let body = IpcCallInfo::new(1, "getVersion").encode_body().unwrap();
        assert_eq!(fields(&body), ["1", "getVersion", " 0 "]);
    }

    #[test]
    fn dotted_call_interleaves_markers() {
        let body = IpcCallInfo::new(7, "a.b.c").encode_body().unwrap();
        assert_eq!(fields(&body), ["7", "a", " 0 ", "b", " 0 ", "c", " 0 "]);
    }

    #[test]
    fn args_follow_last_segment() {
        let call = IpcCallInfo::new(2, "appWindow.getActiveWorkspace.getLogicalWorkspace")
            .with_arg(IpcData::QString("Router0".into()))
            .with_arg(IpcData::Int(3));
        let body = call.encode_body().unwrap();
        assert_eq!(
            fields(&body),
            [
                "2",
                "appWindow",
                " 0 ",
                "getActiveWorkspace",
                " 0 ",
                "getLogicalWorkspace",
                "9",
                "Router0",
                "4",
                "3",
                " 0 "
            ]
        );
    }

    #[test]
    fn empty_segment_rejected() {
        for name in ["", "a..b", "a.", ".a"] {
            assert!(IpcCallInfo::new(1, name).encode_body().is_err(), "{name:?}");
        }
    }

    #[test]
    fn unsupported_arg_writes_nothing_partial() {
        let call = IpcCallInfo::new(1, "x").with_arg(IpcData::Data(Bytes::from_static(b"z")));
        assert!(matches!(
            call.encode_body(),
            Err(crate::SessionError::Frame(FrameError::UnsupportedType(16)))
        ));
    }

    #[test]
    fn call_decode_recovers_name_and_args() {
        let plain = IpcCallInfo::new(1, "appWindow.getVersion");
        let frame = Frame::new(MessageType::IpcCall, plain.encode_body().unwrap());
        assert_eq!(IpcCallInfo::decode(&frame).unwrap(), plain);

        let with_args = IpcCallInfo::new(4, "a.b")
            .with_arg(IpcData::Bool(true))
            .with_arg(IpcData::Vector {
                element: TypeTag::Int,
                items: vec![IpcData::Int(1), IpcData::Int(2)],
            });
        let frame = Frame::new(MessageType::IpcCall, with_args.encode_body().unwrap());
        assert_eq!(IpcCallInfo::decode(&frame).unwrap(), with_args);
    }

    #[test]
    fn response_with_string_value() {
        let frame = Frame::new(MessageType::IpcCall, &b"1\08\08.2.1.0118\0"[..]);
        let response = IpcCallResponseInfo::decode(&frame, LengthMode::Strict).unwrap();
        assert_eq!(response.call_id, 1);
        assert_eq!(
            response.value(),
            Some(&IpcData::String("8.2.1.0118".into()))
        );
    }

    #[test]
    fn response_without_values() {
        let frame = Frame::new(MessageType::IpcCall, &b"5\0"[..]);
        let response = IpcCallResponseInfo::decode(&frame, LengthMode::Strict).unwrap();
        assert_eq!(response.call_id, 5);
        assert!(response.rets.is_empty());
    }

    #[test]
    fn response_numeric_values_read_from_text() {
        let original = IpcCallResponseInfo::new(
            9,
            vec![IpcData::Int(-4), IpcData::Double(1.5), IpcData::Bool(false)],
        );
        let frame = Frame::new(MessageType::IpcCall, original.encode_body().unwrap());
        let decoded = IpcCallResponseInfo::decode(&frame, LengthMode::Strict).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn response_value_overrunning_declared_length() {
        // Declared length cuts the value field short of its terminator.
        let frame = Frame {
            length: 4 + 5,
            msg_type: MessageType::IpcCall,
            body: Bytes::from_static(b"1\08\0a"),
        };

        let strict = IpcCallResponseInfo::decode(&frame, LengthMode::Strict).unwrap_err();
        assert!(matches!(
            strict,
            crate::SessionError::Frame(FrameError::FrameLengthMismatch { .. })
        ));

        let lenient = IpcCallResponseInfo::decode(&frame, LengthMode::Lenient).unwrap();
        assert_eq!(lenient.call_id, 1);
        assert!(lenient.rets.is_empty());
    }

    #[test]
    fn response_body_shorter_than_declared() {
        // Lenient reader handed over a partial body at end of stream.
        let frame = Frame {
            length: 4 + 40,
            msg_type: MessageType::IpcCall,
            body: Bytes::from_static(b"3\04\042\0"),
        };

        let strict = IpcCallResponseInfo::decode(&frame, LengthMode::Strict).unwrap_err();
        assert!(matches!(
            strict,
            crate::SessionError::Frame(FrameError::FrameLengthMismatch {
                declared: 40,
                actual: 7
            })
        ));

        let lenient = IpcCallResponseInfo::decode(&frame, LengthMode::Lenient).unwrap();
        assert_eq!(lenient.rets, vec![IpcData::Int(42)]);
    }

    #[test]
    fn response_unknown_type_is_error() {
        let frame = Frame::new(MessageType::IpcCall, &b"1\099\0x\0"[..]);
        assert!(matches!(
            IpcCallResponseInfo::decode(&frame, LengthMode::Lenient),
            Err(crate::SessionError::Frame(FrameError::UnsupportedType(99)))
        ));
    }
}
