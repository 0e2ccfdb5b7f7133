//! Content header frame payload.
//!
//! ```text
//! ┌───────────┬───────────┬────────────┬────────────────┬───────────────┐
//! │ Class ID  │ Weight    │ Body size  │ Property flags │ Property list │
//! │ uint16 BE │ uint16 BE │ uint64 BE  │ uint16 BE      │ variable      │
//! └───────────┴───────────┴────────────┴────────────────┴───────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::constants::CLASS_BASIC;
use super::frame::Frame;
use super::properties::BasicPropertyList;
use super::wire_format::{
    frame_type, read_longlong, read_short, write_longlong, write_short, ProtoVersion,
};
use crate::error::{CodecError, Result};

/// Per-message envelope sent ahead of the body frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentHeader {
    /// Declared total body size.
    pub body_size: u64,
    pub class_id: u16,
    /// Unused, always 0 on the wire.
    pub weight: u16,
    property_flags: u16,
    properties: BasicPropertyList,
}

impl ContentHeader {
    /// Create a header for a basic-class message.
    pub fn new(body_size: u64, properties: BasicPropertyList) -> Self {
        Self::with_class(CLASS_BASIC, body_size, properties)
    }

    /// Create a header for an arbitrary content class.
    pub fn with_class(class_id: u16, body_size: u64, properties: BasicPropertyList) -> Self {
        Self {
            body_size,
            class_id,
            weight: 0,
            property_flags: properties.flags(),
            properties,
        }
    }

    /// Property presence bitmask matching `properties()`.
    #[inline]
    pub fn property_flags(&self) -> u16 {
        self.property_flags
    }

    #[inline]
    pub fn properties(&self) -> &BasicPropertyList {
        &self.properties
    }

    /// Replace the property list, keeping the presence bitmask in sync.
    pub fn set_properties(&mut self, properties: BasicPropertyList) {
        self.property_flags = properties.flags();
        self.properties = properties;
    }

    /// Encode the header payload.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B, version: ProtoVersion) -> Result<()> {
        write_short(buf, self.class_id);
        write_short(buf, self.weight);
        write_longlong(buf, self.body_size);
        write_short(buf, self.property_flags);
        self.properties.encode_into(buf, version)
    }

    /// Decode a header payload.
    pub fn decode<B: Buf>(buf: &mut B, version: ProtoVersion) -> Result<Self> {
        let class_id = read_short(buf)?;
        let weight = read_short(buf)?;
        let body_size = read_longlong(buf)?;
        let property_flags = read_short(buf)?;
        let properties = BasicPropertyList::decode(buf, property_flags, version)?;

        Ok(Self {
            body_size,
            class_id,
            weight,
            property_flags,
            properties,
        })
    }

    /// Wrap the header into a header frame on `channel_id`.
    pub fn to_frame(&self, channel_id: u16, version: ProtoVersion) -> Result<Frame> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf, version)?;
        Ok(Frame::new(channel_id, frame_type::HEADER, buf.freeze()))
    }

    /// Decode the header carried by a header frame.
    pub fn from_frame(frame: &Frame, version: ProtoVersion) -> Result<Self> {
        if !frame.is_header() {
            return Err(CodecError::Protocol(format!(
                "Expected content header frame, got frame type {}",
                frame.frame_type
            )));
        }
        let mut payload: Bytes = frame.payload.clone();
        Self::decode(&mut payload, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::properties::{flags, DELIVERY_MODE_PERSISTENT};

    #[test]
    fn test_new_computes_flags() {
        let header = ContentHeader::new(
            15,
            BasicPropertyList::new().with_delivery_mode(DELIVERY_MODE_PERSISTENT),
        );
        assert_eq!(header.class_id, CLASS_BASIC);
        assert_eq!(header.weight, 0);
        assert_eq!(header.property_flags(), flags::DELIVERY_MODE);
    }

    #[test]
    fn test_set_properties_refreshes_flags() {
        let mut header = ContentHeader::new(0, BasicPropertyList::new());
        assert_eq!(header.property_flags(), 0);

        header.set_properties(BasicPropertyList {
            app_id: Some("billing".to_string()),
            ..Default::default()
        });
        assert_eq!(header.property_flags(), flags::APP_ID);
        assert_eq!(header.properties().app_id.as_deref(), Some("billing"));
    }

    #[test]
    fn test_encode_layout() {
        let header = ContentHeader::new(
            0x0102,
            BasicPropertyList::new().with_delivery_mode(DELIVERY_MODE_PERSISTENT),
        );
        let mut buf = BytesMut::new();
        header.encode_into(&mut buf, ProtoVersion::Amqp091).unwrap();

        assert_eq!(
            &buf[..],
            &[0, 60, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02, 0x10, 0x00, 2]
        );
    }

    #[test]
    fn test_frame_round_trip() {
        let props = BasicPropertyList {
            content_type: Some("text/plain".to_string()),
            ..BasicPropertyList::new().with_delivery_mode(1)
        };
        let header = ContentHeader::new(42, props);

        let frame = header.to_frame(5, ProtoVersion::Rabbit).unwrap();
        assert!(frame.is_header());
        assert_eq!(frame.channel_id, 5);

        let decoded = ContentHeader::from_frame(&frame, ProtoVersion::Rabbit).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_from_frame_rejects_body_frame() {
        let frame = Frame::body(1, Bytes::from_static(b"abc"));
        let err = ContentHeader::from_frame(&frame, ProtoVersion::Amqp091).unwrap_err();
        assert!(err.to_string().contains("Expected content header frame"));
    }

    #[test]
    fn test_decode_truncated() {
        let mut bytes = Bytes::from_static(&[0, 60, 0, 0, 0, 0]);
        assert!(ContentHeader::decode(&mut bytes, ProtoVersion::Amqp091).is_err());
    }
}
