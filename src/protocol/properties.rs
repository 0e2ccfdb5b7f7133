//! Basic-class content properties.
//!
//! Every property is optional. Presence is carried by a 16-bit flag word
//! written before the list, highest bit first; only present properties are
//! encoded. Bit 0 would announce a continuation flag word, which basic
//! properties never need, so it is rejected.

use bytes::{Buf, BufMut};

use super::table::{read_table, write_table, Table};
use super::wire_format::{
    read_longlong, read_octet, read_shortstr, write_longlong, write_octet, write_shortstr,
    ProtoVersion,
};
use crate::error::{CodecError, Result};

/// Delivery mode of a message that may be lost on broker restart.
pub const DELIVERY_MODE_TRANSIENT: u8 = 1;

/// Delivery mode of a message that must survive broker restart.
pub const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Property presence bits.
pub mod flags {
    pub const CONTENT_TYPE: u16 = 1 << 15;
    pub const CONTENT_ENCODING: u16 = 1 << 14;
    pub const HEADERS: u16 = 1 << 13;
    pub const DELIVERY_MODE: u16 = 1 << 12;
    pub const PRIORITY: u16 = 1 << 11;
    pub const CORRELATION_ID: u16 = 1 << 10;
    pub const REPLY_TO: u16 = 1 << 9;
    pub const EXPIRATION: u16 = 1 << 8;
    pub const MESSAGE_ID: u16 = 1 << 7;
    pub const TIMESTAMP: u16 = 1 << 6;
    pub const TYPE: u16 = 1 << 5;
    pub const USER_ID: u16 = 1 << 4;
    pub const APP_ID: u16 = 1 << 3;
    pub const RESERVED: u16 = 1 << 2;
    /// Another flag word follows.
    pub const CONTINUATION: u16 = 1;
}

/// Properties of a basic-class message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicPropertyList {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub headers: Option<Table>,
    /// 1 = transient, 2 = persistent.
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub expiration: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<u64>,
    pub message_type: Option<String>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub reserved: Option<String>,
}

impl BasicPropertyList {
    /// Create an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delivery mode.
    pub fn with_delivery_mode(mut self, mode: u8) -> Self {
        self.delivery_mode = Some(mode);
        self
    }

    /// Check if the delivery mode asks for persistence.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.delivery_mode == Some(DELIVERY_MODE_PERSISTENT)
    }

    /// Presence bitmask for the properties currently set.
    pub fn flags(&self) -> u16 {
        let mut bits = 0;
        let mut set = |present: bool, bit: u16| {
            if present {
                bits |= bit;
            }
        };
        set(self.content_type.is_some(), flags::CONTENT_TYPE);
        set(self.content_encoding.is_some(), flags::CONTENT_ENCODING);
        set(self.headers.is_some(), flags::HEADERS);
        set(self.delivery_mode.is_some(), flags::DELIVERY_MODE);
        set(self.priority.is_some(), flags::PRIORITY);
        set(self.correlation_id.is_some(), flags::CORRELATION_ID);
        set(self.reply_to.is_some(), flags::REPLY_TO);
        set(self.expiration.is_some(), flags::EXPIRATION);
        set(self.message_id.is_some(), flags::MESSAGE_ID);
        set(self.timestamp.is_some(), flags::TIMESTAMP);
        set(self.message_type.is_some(), flags::TYPE);
        set(self.user_id.is_some(), flags::USER_ID);
        set(self.app_id.is_some(), flags::APP_ID);
        set(self.reserved.is_some(), flags::RESERVED);
        bits
    }

    /// Encode the present properties in flag order (without the flag word).
    pub fn encode_into<B: BufMut>(&self, buf: &mut B, version: ProtoVersion) -> Result<()> {
        if let Some(v) = &self.content_type {
            write_shortstr(buf, v)?;
        }
        if let Some(v) = &self.content_encoding {
            write_shortstr(buf, v)?;
        }
        if let Some(v) = &self.headers {
            write_table(buf, v, version)?;
        }
        if let Some(v) = self.delivery_mode {
            write_octet(buf, v);
        }
        if let Some(v) = self.priority {
            write_octet(buf, v);
        }
        for v in [&self.correlation_id, &self.reply_to, &self.expiration, &self.message_id]
            .into_iter()
            .flatten()
        {
            write_shortstr(buf, v)?;
        }
        if let Some(v) = self.timestamp {
            write_longlong(buf, v);
        }
        for v in [&self.message_type, &self.user_id, &self.app_id, &self.reserved]
            .into_iter()
            .flatten()
        {
            write_shortstr(buf, v)?;
        }
        Ok(())
    }

    /// Decode the properties announced by `property_flags`.
    pub fn decode<B: Buf>(buf: &mut B, property_flags: u16, version: ProtoVersion) -> Result<Self> {
        if property_flags & flags::CONTINUATION != 0 {
            return Err(CodecError::Protocol(
                "Property flag continuation is not supported for basic properties".to_string(),
            ));
        }

        let has = |bit: u16| property_flags & bit != 0;

        Ok(Self {
            content_type: optional(buf, has(flags::CONTENT_TYPE), read_shortstr)?,
            content_encoding: optional(buf, has(flags::CONTENT_ENCODING), read_shortstr)?,
            headers: optional(buf, has(flags::HEADERS), |b| read_table(b, version))?,
            delivery_mode: optional(buf, has(flags::DELIVERY_MODE), read_octet)?,
            priority: optional(buf, has(flags::PRIORITY), read_octet)?,
            correlation_id: optional(buf, has(flags::CORRELATION_ID), read_shortstr)?,
            reply_to: optional(buf, has(flags::REPLY_TO), read_shortstr)?,
            expiration: optional(buf, has(flags::EXPIRATION), read_shortstr)?,
            message_id: optional(buf, has(flags::MESSAGE_ID), read_shortstr)?,
            timestamp: optional(buf, has(flags::TIMESTAMP), read_longlong)?,
            message_type: optional(buf, has(flags::TYPE), read_shortstr)?,
            user_id: optional(buf, has(flags::USER_ID), read_shortstr)?,
            app_id: optional(buf, has(flags::APP_ID), read_shortstr)?,
            reserved: optional(buf, has(flags::RESERVED), read_shortstr)?,
        })
    }
}

/// Read a value only if its presence bit was set.
fn optional<B, T, F>(buf: &mut B, present: bool, read: F) -> Result<Option<T>>
where
    B: Buf,
    F: FnOnce(&mut B) -> Result<T>,
{
    if present {
        read(buf).map(Some)
    } else {
        Ok(None)
    }
}
