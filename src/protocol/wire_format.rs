//! Wire format primitives.
//!
//! Implements the AMQP frame envelope constants and the primitive field codec
//! shared by frames, content headers, field tables and the persisted message
//! record:
//! ```text
//! ┌────────┬────────────┬──────────┬─────────────┬───────────┐
//! │ Type   │ Channel    │ Size     │ Payload     │ Frame end │
//! │ 1 byte │ uint16 BE  │ uint32 BE│ Size bytes  │ 0xCE      │
//! └────────┴────────────┴──────────┴─────────────┴───────────┘
//! ```
//!
//! All multi-byte integers are Big Endian. Short strings carry a 1-byte
//! length prefix, long strings a 4-byte one.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Frame header size in bytes (type + channel + size).
pub const FRAME_HEADER_SIZE: usize = 7;

/// Octet terminating every frame.
pub const FRAME_END: u8 = 0xCE;

/// Bytes added to a payload by the frame envelope.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + 1;

/// Default maximum frame payload size (128 KiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 131_072;

/// Longest string a 1-byte length prefix can describe.
pub const SHORTSTR_MAX_LEN: usize = u8::MAX as usize;

/// Frame type tags.
pub mod frame_type {
    /// Method frame (class/method + arguments).
    pub const METHOD: u8 = 1;
    /// Content header frame.
    pub const HEADER: u8 = 2;
    /// Content body frame.
    pub const BODY: u8 = 3;
    /// Heartbeat frame (always channel 0, empty payload).
    pub const HEARTBEAT: u8 = 8;

    /// Check if the tag is one of the defined frame types.
    #[inline]
    pub fn is_known(frame_type: u8) -> bool {
        matches!(frame_type, METHOD | HEADER | BODY | HEARTBEAT)
    }
}

/// Protocol dialect used for version-dependent encodings.
///
/// The dialects only differ in the field-table type tags; every other
/// encoding in this crate is identical between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProtoVersion {
    /// AMQP 0-9-1 as published.
    #[default]
    #[serde(rename = "amqp-0-9-1")]
    Amqp091,
    /// AMQP 0-9-1 with the RabbitMQ field-table errata.
    #[serde(rename = "amqp-rabbit")]
    Rabbit,
}

impl ProtoVersion {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtoVersion::Amqp091 => "amqp-0-9-1",
            ProtoVersion::Rabbit => "amqp-rabbit",
        }
    }
}

impl fmt::Display for ProtoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtoVersion {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "amqp-0-9-1" | "0-9-1" => Ok(ProtoVersion::Amqp091),
            "amqp-rabbit" | "rabbit" => Ok(ProtoVersion::Rabbit),
            other => Err(CodecError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Fail with `UnexpectedEof` unless `needed` bytes remain.
#[inline]
pub(crate) fn ensure<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(CodecError::UnexpectedEof { needed, remaining });
    }
    Ok(())
}

/// Read a single octet.
#[inline]
pub fn read_octet<B: Buf>(buf: &mut B) -> Result<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

/// Read a 2-byte unsigned integer.
#[inline]
pub fn read_short<B: Buf>(buf: &mut B) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

/// Read a 4-byte unsigned integer.
#[inline]
pub fn read_long<B: Buf>(buf: &mut B) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

/// Read an 8-byte unsigned integer.
#[inline]
pub fn read_longlong<B: Buf>(buf: &mut B) -> Result<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

/// Read a short string (1-byte length prefix, UTF-8).
pub fn read_shortstr<B: Buf>(buf: &mut B) -> Result<String> {
    let len = read_octet(buf)? as usize;
    ensure(buf, len)?;
    let raw = buf.copy_to_bytes(len);
    Ok(String::from_utf8(raw.to_vec())?)
}

/// Read a long string (4-byte length prefix, raw bytes).
pub fn read_longstr<B: Buf>(buf: &mut B) -> Result<Bytes> {
    let len = read_long(buf)? as usize;
    ensure(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

/// Write a single octet.
#[inline]
pub fn write_octet<B: BufMut>(buf: &mut B, value: u8) {
    buf.put_u8(value);
}

/// Write a 2-byte unsigned integer.
#[inline]
pub fn write_short<B: BufMut>(buf: &mut B, value: u16) {
    buf.put_u16(value);
}

/// Write a 4-byte unsigned integer.
#[inline]
pub fn write_long<B: BufMut>(buf: &mut B, value: u32) {
    buf.put_u32(value);
}

/// Write an 8-byte unsigned integer.
#[inline]
pub fn write_longlong<B: BufMut>(buf: &mut B, value: u64) {
    buf.put_u64(value);
}

/// Write a short string.
///
/// Fails if the string is longer than 255 bytes.
pub fn write_shortstr<B: BufMut>(buf: &mut B, value: &str) -> Result<()> {
    if value.len() > SHORTSTR_MAX_LEN {
        return Err(CodecError::StringTooLong {
            len: value.len(),
            max: SHORTSTR_MAX_LEN,
        });
    }
    buf.put_u8(value.len() as u8);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Write a long string.
///
/// Fails if the data does not fit a 4-byte length prefix.
pub fn write_longstr<B: BufMut>(buf: &mut B, value: &[u8]) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| CodecError::StringTooLong {
        len: value.len(),
        max: u32::MAX as usize,
    })?;
    buf.put_u32(len);
    buf.put_slice(value);
    Ok(())
}
