//! Frame struct and its self-delimiting codec.
//!
//! Represents a complete protocol frame with channel, type and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use amqp_core::protocol::{Frame, frame_type};
//! use bytes::Bytes;
//!
//! let frame = Frame::body(1, Bytes::from_static(b"hello"));
//! let mut encoded = frame.encode().unwrap();
//! assert_eq!(encoded.len(), 7 + 5 + 1);
//!
//! let decoded = Frame::decode(&mut encoded).unwrap();
//! assert_eq!(decoded, frame);
//! assert_eq!(decoded.frame_type, frame_type::BODY);
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::wire_format::{
    ensure, frame_type, read_long, read_octet, read_short, FRAME_END, FRAME_HEADER_SIZE,
    FRAME_OVERHEAD,
};
use crate::error::{CodecError, Result};

/// A complete protocol frame.
///
/// `close_after` and `sync` are directives for the local send path; they are
/// never written to the wire and a decoded frame always has both unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Channel the frame belongs to (0 = connection).
    pub channel_id: u16,
    /// Frame type tag (see `frame_type`).
    pub frame_type: u8,
    /// Close the connection once this frame is sent.
    pub close_after: bool,
    /// Sender waits for this frame to take effect.
    pub sync: bool,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(channel_id: u16, frame_type: u8, payload: Bytes) -> Self {
        Self {
            channel_id,
            frame_type,
            close_after: false,
            sync: false,
            payload,
        }
    }

    /// Create a content body frame.
    pub fn body(channel_id: u16, payload: Bytes) -> Self {
        Self::new(channel_id, frame_type::BODY, payload)
    }

    /// Create a heartbeat frame.
    pub fn heartbeat() -> Self {
        Self::new(0, frame_type::HEARTBEAT, Bytes::new())
    }

    /// Mark the connection for closing after this frame is sent.
    pub fn with_close_after(mut self) -> Self {
        self.close_after = true;
        self
    }

    /// Mark the frame as synchronous.
    pub fn with_sync(mut self) -> Self {
        self.sync = true;
        self
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Number of bytes `encode` produces for this frame.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        self.frame_type == frame_type::METHOD
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        self.frame_type == frame_type::HEADER
    }

    #[inline]
    pub fn is_body(&self) -> bool {
        self.frame_type == frame_type::BODY
    }

    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        self.frame_type == frame_type::HEARTBEAT
    }

    /// Encode the frame into an existing buffer.
    ///
    /// Fails only if the payload does not fit a 4-byte size field.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let size = u32::try_from(self.payload.len()).map_err(|_| {
            CodecError::Protocol(format!(
                "Frame payload of {} bytes does not fit the size field",
                self.payload.len()
            ))
        })?;
        buf.put_u8(self.frame_type);
        buf.put_u16(self.channel_id);
        buf.put_u32(size);
        buf.put_slice(&self.payload);
        buf.put_u8(FRAME_END);
        Ok(())
    }

    /// Encode the frame as a single contiguous buffer.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode one frame from the front of `buf`.
    ///
    /// Consumes exactly the bytes `encode` produced for the frame, so frames
    /// can be decoded back-to-back from a concatenation without a count.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure(buf, FRAME_HEADER_SIZE)?;
        let frame_type = read_octet(buf)?;
        let channel_id = read_short(buf)?;
        let size = read_long(buf)? as usize;

        ensure(buf, size + 1)?;
        let payload = buf.copy_to_bytes(size);
        let end = buf.get_u8();
        if end != FRAME_END {
            return Err(CodecError::InvalidFrameEnd(end));
        }

        Ok(Self::new(channel_id, frame_type, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(3, frame_type::METHOD, Bytes::from_static(b"hello"));

        assert_eq!(frame.channel_id, 3);
        assert!(frame.is_method());
        assert!(!frame.close_after);
        assert!(!frame.sync);
        assert_eq!(frame.payload(), b"hello");
        assert_eq!(frame.payload_len(), 5);
    }

    #[test]
    fn test_frame_builders() {
        let frame = Frame::new(0, frame_type::METHOD, Bytes::new())
            .with_close_after()
            .with_sync();
        assert!(frame.close_after);
        assert!(frame.sync);
    }

    #[test]
    fn test_heartbeat() {
        let frame = Frame::heartbeat();
        assert!(frame.is_heartbeat());
        assert_eq!(frame.channel_id, 0);
        assert_eq!(frame.encode().unwrap().len(), FRAME_OVERHEAD);
    }

    #[test]
    fn test_encode_layout() {
        let frame = Frame::body(0x0102, Bytes::from_static(b"abc"));
        let bytes = frame.encode().unwrap();

        assert_eq!(
            &bytes[..],
            &[frame_type::BODY, 0x01, 0x02, 0, 0, 0, 3, b'a', b'b', b'c', FRAME_END]
        );
        assert_eq!(bytes.len(), frame.encoded_len());
    }

    #[test]
    fn test_send_directives_not_encoded() {
        let plain = Frame::body(1, Bytes::from_static(b"x"));
        let flagged = plain.clone().with_close_after().with_sync();
        assert_eq!(plain.encode().unwrap(), flagged.encode().unwrap());

        let decoded = Frame::decode(&mut flagged.encode().unwrap()).unwrap();
        assert_eq!(decoded, plain);
    }

    #[test]
    fn test_decode_consumes_exactly_one_frame() {
        let first = Frame::body(1, Bytes::from_static(b"first"));
        let second = Frame::body(1, Bytes::new());
        let third = Frame::body(2, Bytes::from_static(b"third"));

        let mut buf = BytesMut::new();
        for frame in [&first, &second, &third] {
            frame.encode_into(&mut buf).unwrap();
        }
        let mut bytes = buf.freeze();

        assert_eq!(Frame::decode(&mut bytes).unwrap(), first);
        assert_eq!(Frame::decode(&mut bytes).unwrap(), second);
        assert_eq!(Frame::decode(&mut bytes).unwrap(), third);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_bad_frame_end() {
        let mut raw = Frame::body(1, Bytes::from_static(b"abc")).encode().unwrap().to_vec();
        let last = raw.len() - 1;
        raw[last] = 0x00;

        let err = Frame::decode(&mut Bytes::from(raw)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFrameEnd(0x00)));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = Frame::body(1, Bytes::from_static(b"abcdef")).encode().unwrap();

        // Short header
        assert!(Frame::decode(&mut encoded.slice(..5)).is_err());
        // Missing frame end
        let err = Frame::decode(&mut encoded.slice(..encoded.len() - 1)).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof { .. }));
    }
}
