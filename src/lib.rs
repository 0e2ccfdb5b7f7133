//! # amqp-core
//!
//! Message-entity core of an AMQP 0-9-1 broker.
//!
//! This crate holds the pieces the protocol engine relies on when a message
//! is published, stored and confirmed. It performs no I/O and makes no
//! routing decisions.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): frames, the frame buffer, field tables,
//!   basic properties and the content header
//! - **Message** ([`message`]): the aggregate built from a publish, its
//!   persisted record, identity generation and publisher-confirm bookkeeping
//! - **Protocol errors** ([`ProtocolError`]): violations classified as
//!   connection- or channel-scoped
//!
//! ## Example
//!
//! ```
//! use amqp_core::message::{Message, MessageIdGenerator};
//! use amqp_core::protocol::{ContentHeader, FrameBuffer, ProtoVersion};
//!
//! # fn main() -> amqp_core::Result<()> {
//! # let header = ContentHeader::new(0, Default::default()).to_frame(1, ProtoVersion::Amqp091)?;
//! # let wire = header.encode()?;
//! let ids = MessageIdGenerator::new();
//! let mut frames = FrameBuffer::new();
//! let mut message = Message::new("logs", "info", false, false);
//!
//! for frame in frames.push(&wire)? {
//!     if frame.is_header() {
//!         message.set_header(ContentHeader::from_frame(&frame, ProtoVersion::Amqp091)?);
//!     } else if frame.is_body() {
//!         message.append(frame);
//!     }
//! }
//!
//! if message.is_complete() {
//!     ids.assign(&mut message);
//! }
//! # assert_ne!(message.id(), 0);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod message;
pub mod protocol;
pub mod protocol_error;

pub use error::{CodecError, Result};
pub use message::{ConfirmMeta, Message, MessageIdGenerator};
pub use protocol::{ContentHeader, Frame, ProtoVersion};
pub use protocol_error::{ErrorScope, ProtocolError};
