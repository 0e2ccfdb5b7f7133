//! Error types for amqp-core.

use thiserror::Error;

use crate::protocol::ProtoVersion;

/// Main error type for all encode/decode operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Buffer ended before a field could be read.
    #[error("Unexpected end of buffer: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// String does not fit its length prefix.
    #[error("String of {len} bytes exceeds maximum {max}")]
    StringTooLong { len: usize, max: usize },

    /// Short string is not valid UTF-8.
    #[error("Invalid UTF-8 in short string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Frame terminator octet is not `FRAME_END`.
    #[error("Invalid frame end octet: {0:#04x}")]
    InvalidFrameEnd(u8),

    /// Frame payload is larger than the configured maximum.
    #[error("Frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: u32, max: u32 },

    /// Field table contains a type tag the protocol version does not know.
    #[error("Unknown field type {tag:?} for {version}")]
    UnknownFieldType { tag: char, version: ProtoVersion },

    /// Field value cannot be expressed in the given protocol version.
    #[error("Field value {kind} is not supported by {version}")]
    UnsupportedFieldValue {
        kind: &'static str,
        version: ProtoVersion,
    },

    /// Unrecognized protocol version name.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocol(String),

    /// Message has no content header to persist.
    #[error("Message has no content header")]
    MissingContentHeader,

    /// Protocol error (wrong frame type, flag continuation, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using CodecError.
pub type Result<T> = std::result::Result<T, CodecError>;
