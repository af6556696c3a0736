//! Authentication and disconnect message bodies.

use std::fmt;

use bytes::Bytes;
use ptmp_frame::{BodyBuilder, Frame};
use serde::Serialize;

use crate::error::Result;

/// Client → server: who is authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationRequest {
    pub username: String,
}

impl AuthenticationRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.field(&self.username);
        body.finish()
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        Ok(Self {
            username: cursor.read_str("username")?,
        })
    }
}

/// Server → client: the challenge the digest must answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationChallenge {
    pub challenge: String,
}

impl AuthenticationChallenge {
    pub fn new(challenge: impl Into<String>) -> Self {
        Self {
            challenge: challenge.into(),
        }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.field(&self.challenge);
        body.finish()
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        Ok(Self {
            challenge: cursor.read_str("challenge")?,
        })
    }
}

/// Client → server: the answer to a challenge.
///
/// The digest is opaque here; computing it from the challenge is the
/// caller's job. It is redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationResponse {
    pub username: String,
    pub digest: String,
    pub custom: String,
}

impl AuthenticationResponse {
    pub fn new(
        username: impl Into<String>,
        digest: impl Into<String>,
        custom: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            digest: digest.into(),
            custom: custom.into(),
        }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.field(&self.username)
            .field(&self.digest)
            .field(&self.custom);
        body.finish()
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        Ok(Self {
            username: cursor.read_str("username")?,
            digest: cursor.read_str("digest")?,
            custom: cursor.read_str("custom")?,
        })
    }
}

impl fmt::Debug for AuthenticationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationResponse")
            .field("username", &self.username)
            .field(
                "digest",
                &format_args!("<redacted:{} bytes>", self.digest.len()),
            )
            .field("custom", &self.custom)
            .finish()
    }
}

/// Server → client: whether authentication succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticationStatus {
    pub status: bool,
}

impl AuthenticationStatus {
    pub fn new(status: bool) -> Self {
        Self { status }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.bool(self.status);
        body.finish()
    }

    /// An empty status field reads as `false`.
    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        Ok(Self {
            status: cursor.read_bool("status")?,
        })
    }
}

/// Either side: closing the session, with an optional reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disconnect {
    pub reason: String,
}

impl Disconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.field(&self.reason);
        body.finish()
    }

    /// A body without any complete field reads as an empty reason.
    pub fn decode(frame: &Frame) -> Self {
        let mut cursor = frame.fields();
        Self {
            reason: cursor.read_str("reason").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ptmp_frame::{FrameError, MessageType};

    use super::*;
    use crate::error::SessionError;

    #[test]
    fn request_body_is_single_field() {
        let body = AuthenticationRequest::new("net.ihitc.ptmptest").encode_body();
        assert_eq!(body.as_ref(), b"net.ihitc.ptmptest\0");
    }

    #[test]
    fn response_body_has_three_fields() {
        let body = AuthenticationResponse::new("user", "cisco", "").encode_body();
        assert_eq!(body.as_ref(), b"user\0cisco\0\0");

        let frame = Frame::new(MessageType::AuthenticationResponse, body);
        let decoded = AuthenticationResponse::decode(&frame).unwrap();
        assert_eq!(decoded.digest, "cisco");
        assert_eq!(decoded.custom, "");
    }

    #[test]
    fn response_debug_redacts_digest() {
        let response = AuthenticationResponse::new("user", "s3cr3t-digest", "");
        let debug = format!("{response:?}");
        assert!(!debug.contains("s3cr3t-digest"));
        assert!(debug.contains("<redacted:13 bytes>"));
        assert!(debug.contains("user"));
    }

    #[test]
    fn challenge_decodes_text() {
        let frame = Frame::new(MessageType::AuthenticationChallenge, &b"a1b2c3\0"[..]);
        let challenge = AuthenticationChallenge::decode(&frame).unwrap();
        assert_eq!(challenge.challenge, "a1b2c3");
    }

    #[test]
    fn status_spellings() {
        let decode = |body: &'static [u8]| {
            AuthenticationStatus::decode(&Frame::new(MessageType::AuthenticationStatus, body))
        };
        assert!(decode(b"true\0").unwrap().status);
        assert!(decode(b"1\0").unwrap().status);
        assert!(!decode(b"false\0").unwrap().status);
        assert!(!decode(b"\0").unwrap().status);
        assert!(matches!(
            decode(b"maybe\0"),
            Err(SessionError::Frame(FrameError::InvalidFieldValue { .. }))
        ));
    }

    #[test]
    fn status_encodes_as_text() {
        assert_eq!(AuthenticationStatus::new(true).encode_body().as_ref(), b"true\0");
    }

    #[test]
    fn disconnect_reason_optional() {
        let frame = Frame::new(MessageType::Disconnect, &b"bye\0"[..]);
        assert_eq!(Disconnect::decode(&frame).reason, "bye");

        let empty = Frame::new(MessageType::Disconnect, &b""[..]);
        assert_eq!(Disconnect::decode(&empty).reason, "");
    }
}
