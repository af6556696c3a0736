//! Negotiation message bodies.
//!
//! Request and response share one layout, ten fields in this order:
//! identifier, version, `{appId}`, encoding, encryption, compression,
//! authentication, timestamp, keep-alive period, reserved. Clients append
//! one empty field after `reserved`; readers ignore anything past it.

use bytes::Bytes;
use ptmp_frame::{BodyBuilder, FieldCursor, Frame};
use serde::Serialize;

use crate::error::{Result, SessionError};

/// Protocol identifier carried in the first negotiation field.
pub const PTMP_IDENTIFIER: &str = "PTMP";
/// The only protocol version this crate speaks.
pub const PTMP_VERSION: i32 = 1;
/// Keep-alive period in seconds advertised by default.
pub const DEFAULT_KEEP_ALIVE_PERIOD: i32 = 60;
/// Reserved field sent by Packet Tracer 8 clients.
pub const DEFAULT_RESERVED: &str = ":PTVER8.0.0.0000";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub mod encoding {
    pub const TEXT: i32 = 1;
    pub const BINARY: i32 = 2;
}

pub mod encryption {
    pub const NONE: i32 = 1;
}

pub mod compression {
    pub const NONE: i32 = 1;
}

pub mod authentication {
    pub const CLEARTEXT: i32 = 1;
    pub const SIMPLE: i32 = 2;
    pub const MD5: i32 = 4;
}

/// Parameters exchanged during negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationInfo {
    pub identifier: String,
    pub version: i32,
    /// Application id without the surrounding braces used on the wire.
    pub app_id: String,
    pub encoding: i32,
    pub encryption: i32,
    pub compression: i32,
    pub authentication: i32,
    /// Local time formatted `YYYYMMDDhhmmss`.
    pub timestamp: String,
    /// Keep-alive period in seconds.
    pub keep_alive_period: i32,
    pub reserved: String,
}

impl NegotiationInfo {
    /// Client defaults: text encoding, no encryption or compression,
    /// the given authentication method and the current local time.
    pub fn new(app_id: impl Into<String>, authentication: i32) -> Self {
        Self {
            identifier: PTMP_IDENTIFIER.to_string(),
            version: PTMP_VERSION,
            app_id: app_id.into(),
            encoding: encoding::TEXT,
            encryption: encryption::NONE,
            compression: compression::NONE,
            authentication,
            timestamp: current_timestamp(),
            keep_alive_period: DEFAULT_KEEP_ALIVE_PERIOD,
            reserved: DEFAULT_RESERVED.to_string(),
        }
    }

    pub fn encode_body(&self) -> Bytes {
        let mut body = BodyBuilder::new();
        body.field(&self.identifier)
            .int(self.version)
            .field(&format!("{{{}}}", self.app_id))
            .int(self.encoding)
            .int(self.encryption)
            .int(self.compression)
            .int(self.authentication)
            .field(&self.timestamp)
            .int(self.keep_alive_period)
            .field(&self.reserved)
            .field("");
        body.finish()
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let mut cursor = frame.fields();
        let info = Self::decode_fields(&mut cursor)?;
        cursor.skip_rest();
        Ok(info)
    }

    fn decode_fields(cursor: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            identifier: cursor.read_str("identifier")?,
            version: cursor.read_int("version")?,
            app_id: strip_braces(&cursor.read_str("app id")?).to_string(),
            encoding: cursor.read_int("encoding")?,
            encryption: cursor.read_int("encryption")?,
            compression: cursor.read_int("compression")?,
            authentication: cursor.read_int("authentication")?,
            timestamp: cursor.read_str("timestamp")?,
            keep_alive_period: cursor.read_int("keep-alive period")?,
            reserved: cursor.read_str("reserved")?,
        })
    }

    /// Reject a peer that does not speak PTMP version 1.
    pub fn validate(&self) -> Result<()> {
        if self.identifier != PTMP_IDENTIFIER {
            return Err(SessionError::Negotiation(format!(
                "unexpected protocol identifier '{}'",
                self.identifier
            )));
        }
        if self.version != PTMP_VERSION {
            return Err(SessionError::Negotiation(format!(
                "unsupported protocol version {} (expected {PTMP_VERSION})",
                self.version
            )));
        }
        Ok(())
    }
}

/// Fresh random application id.
pub fn generate_app_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current local time in the negotiation timestamp format.
pub fn current_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn strip_braces(value: &str) -> &str {
    value
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(value)
}
