//! Message entity - the aggregate assembled from a publish.
//!
//! A [`Message`] is created when a `basic.publish` arrives, receives its
//! [`ContentHeader`] from the header frame, then accumulates body frames in
//! arrival order. Once complete it is handed to routing and, if durable,
//! persisted with [`Message::marshal`].
//!
//! # Persisted record
//!
//! ```text
//! ┌──────────┬────────────────┬──────────┬─────────────┬───────────┬──────────────┬────────────────┐
//! │ ID       │ Content header │ Exchange │ Routing key │ Body size │ Body frames  │ Delivery count │
//! │ uint64   │ variable       │ shortstr │ shortstr    │ uint64    │ longstr blob │ uint32         │
//! └──────────┴────────────────┴──────────┴─────────────┴───────────┴──────────────┴────────────────┘
//! ```
//!
//! The body blob is the concatenation of the encoded body frames. Frames are
//! self-delimiting, so no frame count is stored. Publish flags and the
//! confirm contract are transient and not part of the record.
//!
//! # Example
//!
//! ```
//! use amqp_core::message::{Message, MessageIdGenerator};
//! use amqp_core::protocol::{BasicPropertyList, ContentHeader, Frame, ProtoVersion};
//! use bytes::Bytes;
//!
//! let ids = MessageIdGenerator::new();
//! let mut message = Message::new("logs", "info", false, false);
//! ids.assign(&mut message);
//! message.set_header(ContentHeader::new(5, BasicPropertyList::new().with_delivery_mode(2)));
//! message.append(Frame::body(1, Bytes::from_static(b"hello")));
//!
//! assert!(message.is_complete());
//! assert!(message.is_persistent());
//!
//! let record = message.marshal(ProtoVersion::Amqp091).unwrap();
//! let restored = Message::unmarshal(&record, ProtoVersion::Amqp091).unwrap();
//! assert_eq!(restored, message);
//! ```

mod confirm;
mod identity;

pub use confirm::ConfirmMeta;
pub use identity::MessageIdGenerator;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::protocol::{
    read_long, read_longlong, read_longstr, read_shortstr, write_long, write_longlong,
    write_longstr, write_shortstr, ContentHeader, Frame, ProtoVersion,
};

/// A published message and its routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Process-unique identity, 0 until assigned.
    id: u64,
    /// Running sum of body frame payload lengths.
    body_size: u64,
    /// Number of times the message has been redelivered.
    pub delivery_count: u32,
    pub mandatory: bool,
    pub immediate: bool,
    pub exchange: String,
    pub routing_key: String,
    /// Present when the publishing channel is in confirm mode.
    pub confirm_meta: Option<ConfirmMeta>,
    header: Option<ContentHeader>,
    body: Vec<Frame>,
}

impl Message {
    /// Create an empty message for a publish.
    pub fn new(
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
        mandatory: bool,
        immediate: bool,
    ) -> Self {
        Self {
            id: 0,
            body_size: 0,
            delivery_count: 0,
            mandatory,
            immediate,
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            confirm_meta: None,
            header: None,
            body: Vec::new(),
        }
    }

    /// Identity, or 0 if none has been assigned yet.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Total payload length of the body frames.
    #[inline]
    pub fn body_size(&self) -> u64 {
        self.body_size
    }

    #[inline]
    pub fn header(&self) -> Option<&ContentHeader> {
        self.header.as_ref()
    }

    /// Attach the content header once its frame has arrived.
    pub fn set_header(&mut self, header: ContentHeader) {
        self.header = Some(header);
    }

    /// Body frames in arrival order.
    #[inline]
    pub fn body(&self) -> &[Frame] {
        &self.body
    }

    /// Append a body frame.
    ///
    /// Must be called in wire arrival order; frames are neither reordered
    /// nor deduplicated.
    pub fn append(&mut self, frame: Frame) {
        self.body_size += frame.payload_len() as u64;
        self.body.push(frame);
    }

    /// Check if the message asks to survive a broker restart.
    ///
    /// Only meaningful once the header is attached; before that the
    /// message reports transient.
    pub fn is_persistent(&self) -> bool {
        self.header
            .as_ref()
            .is_some_and(|header| header.properties().is_persistent())
    }

    /// Check if the header is attached and the body reached its declared size.
    pub fn is_complete(&self) -> bool {
        self.header
            .as_ref()
            .is_some_and(|header| header.body_size == self.body_size)
    }

    /// Count one more delivery attempt.
    pub fn mark_redelivered(&mut self) {
        self.delivery_count = self.delivery_count.saturating_add(1);
    }

    /// Encode the message into its persisted record.
    ///
    /// # Errors
    ///
    /// Fails if no header is attached or a field does not fit its encoding
    /// (exchange or routing key over 255 bytes, field value the protocol
    /// version cannot express).
    pub fn marshal(&self, version: ProtoVersion) -> Result<Bytes> {
        let header = self.header.as_ref().ok_or(CodecError::MissingContentHeader)?;

        let mut buf = BytesMut::new();
        write_longlong(&mut buf, self.id);
        header.encode_into(&mut buf, version)?;
        write_shortstr(&mut buf, &self.exchange)?;
        write_shortstr(&mut buf, &self.routing_key)?;
        write_longlong(&mut buf, self.body_size);

        let mut body = BytesMut::with_capacity(self.body.iter().map(Frame::encoded_len).sum());
        for frame in &self.body {
            frame.encode_into(&mut body)?;
        }
        write_longstr(&mut buf, &body)?;

        write_long(&mut buf, self.delivery_count);
        Ok(buf.freeze())
    }

    /// Restore a message from its persisted record.
    ///
    /// Any malformed or truncated field fails the whole operation; no
    /// partially decoded message is returned.
    pub fn unmarshal(data: &[u8], version: ProtoVersion) -> Result<Self> {
        let mut buf = data;
        match Self::decode_record(&mut buf, version) {
            Ok(message) => {
                if buf.has_remaining() {
                    tracing::warn!(
                        id = message.id,
                        trailing = buf.remaining(),
                        "Ignoring trailing bytes after message record"
                    );
                }
                tracing::trace!(id = message.id, frames = message.body.len(), "Unmarshaled message");
                Ok(message)
            }
            Err(err) => {
                tracing::debug!(error = %err, len = data.len(), "Failed to unmarshal message");
                Err(err)
            }
        }
    }

    fn decode_record<B: Buf>(buf: &mut B, version: ProtoVersion) -> Result<Self> {
        let id = read_longlong(buf)?;
        let header = ContentHeader::decode(buf, version)?;
        let exchange = read_shortstr(buf)?;
        let routing_key = read_shortstr(buf)?;
        let body_size = read_longlong(buf)?;
        let body = decode_body(read_longstr(buf)?)?;
        let delivery_count = read_long(buf)?;

        Ok(Self {
            id,
            body_size,
            delivery_count,
            mandatory: false,
            immediate: false,
            exchange,
            routing_key,
            confirm_meta: None,
            header: Some(header),
            body,
        })
    }
}

/// Split the body blob back into frames.
///
/// Bounded by the blob's byte count rather than an end marker, so an empty
/// frame in the middle cannot end the loop early.
fn decode_body(mut raw: Bytes) -> Result<Vec<Frame>> {
    let mut remaining = raw.len();
    let mut body = Vec::new();
    while remaining > 0 {
        let frame = Frame::decode(&mut raw)?;
        remaining -= frame.encoded_len();
        body.push(frame);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BasicPropertyList, FieldValue, Table, DELIVERY_MODE_PERSISTENT};

    fn header_with(delivery_mode: Option<u8>) -> ContentHeader {
        let mut headers = Table::new();
        headers.insert("x-source".to_string(), FieldValue::LongStr(Bytes::from_static(b"app")));
        let props = BasicPropertyList {
            content_type: Some("text/plain".to_string()),
            headers: Some(headers),
            delivery_mode,
            ..Default::default()
        };
        ContentHeader::new(15, props)
    }

    fn body_frame(len: usize) -> Frame {
        Frame::body(1, Bytes::from(vec![b'x'; len]))
    }

    fn logs_message() -> Message {
        let mut message = Message::new("logs", "info", false, false);
        MessageIdGenerator::with_seed(1_000).assign(&mut message);
        message.set_header(header_with(Some(DELIVERY_MODE_PERSISTENT)));
        for len in [3, 5, 7] {
            message.append(body_frame(len));
        }
        message
    }

    #[test]
    fn test_new_message_is_empty() {
        let message = Message::new("amq.topic", "a.b", true, false);

        assert_eq!(message.id(), 0);
        assert_eq!(message.body_size(), 0);
        assert_eq!(message.delivery_count, 0);
        assert!(message.mandatory);
        assert!(!message.immediate);
        assert_eq!(message.exchange, "amq.topic");
        assert_eq!(message.routing_key, "a.b");
        assert!(message.header().is_none());
        assert!(message.body().is_empty());
        assert!(message.confirm_meta.is_none());
    }

    #[test]
    fn test_append_accumulates_in_order() {
        let mut message = Message::new("logs", "info", false, false);
        for (i, len) in [3, 5, 7].into_iter().enumerate() {
            message.append(Frame::body(i as u16, Bytes::from(vec![0u8; len])));
        }

        assert_eq!(message.body_size(), 15);
        assert_eq!(message.body().len(), 3);
        let lens: Vec<_> = message.body().iter().map(Frame::payload_len).collect();
        assert_eq!(lens, vec![3, 5, 7]);
        let channels: Vec<_> = message.body().iter().map(|f| f.channel_id).collect();
        assert_eq!(channels, vec![0, 1, 2]);
    }

    #[test]
    fn test_is_persistent() {
        let mut message = Message::new("", "q", false, false);
        assert!(!message.is_persistent());

        message.set_header(header_with(Some(2)));
        assert!(message.is_persistent());

        message.set_header(header_with(Some(1)));
        assert!(!message.is_persistent());

        message.set_header(header_with(None));
        assert!(!message.is_persistent());
    }

    #[test]
    fn test_is_complete() {
        let mut message = Message::new("", "q", false, false);
        assert!(!message.is_complete());

        message.set_header(header_with(None));
        message.append(body_frame(10));
        assert!(!message.is_complete());

        message.append(body_frame(5));
        assert!(message.is_complete());
    }

    #[test]
    fn test_mark_redelivered() {
        let mut message = Message::new("", "q", false, false);
        message.mark_redelivered();
        message.mark_redelivered();
        assert_eq!(message.delivery_count, 2);
    }

    #[test]
    fn test_round_trip() {
        let mut message = logs_message();
        message.delivery_count = 4;

        for version in [ProtoVersion::Amqp091, ProtoVersion::Rabbit] {
            let record = message.marshal(version).unwrap();
            let restored = Message::unmarshal(&record, version).unwrap();

            assert_eq!(restored, message);
            assert_eq!(restored.body_size(), 15);
            assert_eq!(restored.body().len(), 3);
            let lens: Vec<_> = restored.body().iter().map(Frame::payload_len).collect();
            assert_eq!(lens, vec![3, 5, 7]);
        }
    }

    #[test]
    fn test_zero_body_round_trip() {
        let mut message = Message::new("", "empty", false, false);
        message.set_header(ContentHeader::new(0, BasicPropertyList::new()));

        let record = message.marshal(ProtoVersion::Amqp091).unwrap();
        let restored = Message::unmarshal(&record, ProtoVersion::Amqp091).unwrap();

        assert_eq!(restored, message);
        assert_eq!(restored.body_size(), 0);
        assert!(restored.body().is_empty());
    }

    #[test]
    fn test_empty_frame_inside_body() {
        let mut message = Message::new("", "q", false, false);
        message.set_header(ContentHeader::new(4, BasicPropertyList::new()));
        message.append(body_frame(2));
        message.append(body_frame(0));
        message.append(body_frame(2));

        let record = message.marshal(ProtoVersion::Amqp091).unwrap();
        let restored = Message::unmarshal(&record, ProtoVersion::Amqp091).unwrap();
        assert_eq!(restored.body().len(), 3);
        assert_eq!(restored, message);
    }

    #[test]
    fn test_record_layout() {
        let message = logs_message();
        let record = message.marshal(ProtoVersion::Amqp091).unwrap();

        assert_eq!(&record[..8], &message.id().to_be_bytes());
        // Delivery count closes the record
        assert_eq!(&record[record.len() - 4..], &[0, 0, 0, 0]);

        // Body blob: 3 frames of 8 bytes overhead each, plus payloads
        let blob_len = 3 * 8 + 15;
        let blob_start = record.len() - 4 - blob_len;
        assert_eq!(
            &record[blob_start - 4..blob_start],
            &(blob_len as u32).to_be_bytes()
        );
        assert_eq!(&record[blob_start - 12..blob_start - 4], &15u64.to_be_bytes());
    }

    #[test]
    fn test_transient_fields_not_persisted() {
        let mut message = Message::new("amq.direct", "rk", true, true);
        message.set_header(ContentHeader::new(0, BasicPropertyList::new()));
        message.confirm_meta = Some(ConfirmMeta::new(1, 2, 3, 1));

        let record = message.marshal(ProtoVersion::Amqp091).unwrap();
        let restored = Message::unmarshal(&record, ProtoVersion::Amqp091).unwrap();

        assert!(!restored.mandatory);
        assert!(!restored.immediate);
        assert!(restored.confirm_meta.is_none());
        assert_eq!(restored.exchange, "amq.direct");
    }

    #[test]
    fn test_marshal_without_header_fails() {
        let message = Message::new("logs", "info", false, false);
        let err = message.marshal(ProtoVersion::Amqp091).unwrap_err();
        assert!(matches!(err, CodecError::MissingContentHeader));
    }

    #[test]
    fn test_marshal_long_routing_key_fails() {
        let mut message = Message::new("logs", "k".repeat(300), false, false);
        message.set_header(ContentHeader::new(0, BasicPropertyList::new()));
        assert!(message.marshal(ProtoVersion::Amqp091).is_err());
    }

    #[test]
    fn test_every_truncation_fails() {
        let record = logs_message().marshal(ProtoVersion::Amqp091).unwrap();
        for len in 0..record.len() {
            assert!(
                Message::unmarshal(&record[..len], ProtoVersion::Amqp091).is_err(),
                "prefix of {len} bytes decoded"
            );
        }
    }

    #[test]
    fn test_corrupt_frame_in_body_fails() {
        let record = logs_message().marshal(ProtoVersion::Amqp091).unwrap();
        let mut corrupt = record.to_vec();
        // Frame end of the last body frame sits right before the delivery count
        let last_frame_end = corrupt.len() - 5;
        corrupt[last_frame_end] = 0;

        let err = Message::unmarshal(&corrupt, ProtoVersion::Amqp091).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFrameEnd(0)));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let message = logs_message();
        let mut record = message.marshal(ProtoVersion::Amqp091).unwrap().to_vec();
        record.extend_from_slice(b"junk");

        let restored = Message::unmarshal(&record, ProtoVersion::Amqp091).unwrap();
        assert_eq!(restored, message);
    }
}
