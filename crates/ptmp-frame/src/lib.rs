//! PTMP wire codec.
//!
//! Every PTMP message travels as one frame of NUL-terminated ASCII fields:
//! - a decimal `length` field counting the bytes of `type` field + body
//! - a decimal message `type` field
//! - the body, itself a run of NUL-terminated fields
//!
//! ```text
//! <length>\0<type>\0<field>\0<field>\0...
//! ```
//!
//! Bodies are written with [`BodyBuilder`], read back with [`FieldCursor`],
//! and IPC arguments/returns are carried as [`IpcData`] values.

pub mod codec;
pub mod error;
pub mod field;
pub mod message;
pub mod observer;
pub mod reader;
pub mod value;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::PtmpCodec;
pub use codec::{
    decode_frame, decode_partial_frame, encode_frame, Frame, FrameConfig, LengthMode,
    DEFAULT_MAX_FRAME_LENGTH,
};
pub use error::{FrameError, Result};
pub use field::{write_field, BodyBuilder, FieldCursor, FIELD_TERMINATOR};
pub use message::MessageType;
pub use observer::{escape_nul, FrameObserver, NoopObserver, TracingObserver};
pub use reader::FrameReader;
pub use value::{IpcData, TypeTag, MAX_VECTOR_DEPTH};
pub use writer::FrameWriter;
