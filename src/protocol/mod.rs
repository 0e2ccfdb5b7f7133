//! Protocol module - wire format, framing, and content headers.
//!
//! This module implements the binary layer underneath the message entity:
//! - Primitive big-endian field codec and protocol dialects
//! - Frame struct and self-delimiting frame codec
//! - Frame buffer for accumulating partial reads
//! - Field tables, basic properties and the content header
//! - Reply codes and class identifiers

pub mod constants;
mod content_header;
mod frame;
mod frame_buffer;
pub mod properties;
mod table;
mod wire_format;

pub use content_header::ContentHeader;
pub use frame::Frame;
pub use frame_buffer::FrameBuffer;
pub use properties::{BasicPropertyList, DELIVERY_MODE_PERSISTENT, DELIVERY_MODE_TRANSIENT};
pub use table::{read_table, write_table, Decimal, FieldValue, Table};
pub use wire_format::{
    frame_type, read_long, read_longlong, read_longstr, read_octet, read_short, read_shortstr,
    write_long, write_longlong, write_longstr, write_octet, write_short, write_shortstr,
    ProtoVersion, DEFAULT_MAX_FRAME_SIZE, FRAME_END, FRAME_HEADER_SIZE, FRAME_OVERHEAD,
    SHORTSTR_MAX_LEN,
};
