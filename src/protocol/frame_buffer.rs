//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 7 bytes (type, channel, size)
//! - `WaitingForPayload`: Header parsed, need size + 1 more bytes (payload + frame end)
//!
//! # Example
//!
//! ```
//! use amqp_core::protocol::{Frame, FrameBuffer};
//! use bytes::Bytes;
//!
//! let encoded = Frame::body(1, Bytes::from_static(b"hello")).encode().unwrap();
//!
//! let mut buffer = FrameBuffer::new();
//! assert!(buffer.push(&encoded[..4]).unwrap().is_empty());
//!
//! let frames = buffer.push(&encoded[4..]).unwrap();
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].payload(), b"hello");
//! ```

use bytes::{Buf, BytesMut};

use super::wire_format::{DEFAULT_MAX_FRAME_SIZE, FRAME_END, FRAME_HEADER_SIZE};
use super::Frame;
use crate::error::{CodecError, Result};

/// Parsed frame header, held while the payload is still arriving.
#[derive(Debug, Clone, Copy)]
struct PendingHeader {
    frame_type: u8,
    channel_id: u16,
    size: u32,
}

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for complete header (need 7 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for payload and frame-end bytes.
    WaitingForPayload(PendingHeader),
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// Uses a state machine to handle partial reads efficiently.
/// All data is stored in a single `BytesMut` buffer to minimize allocations.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_frame_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max frame size: 128KB.
    pub fn new() -> Self {
        Self::with_capacity_and_max_frame_size(64 * 1024, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self::with_capacity_and_max_frame_size(64 * 1024, max_frame_size)
    }

    /// Create a new frame buffer with custom capacity and max frame size.
    pub fn with_capacity_and_max_frame_size(capacity: usize, max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::WaitingForHeader,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the complete frames in arrival order (may be empty if still
    /// waiting for data). Partial data is buffered for the next push.
    ///
    /// # Errors
    ///
    /// Returns error if a frame exceeds the max frame size or is not
    /// terminated by `FRAME_END`. The connection is unusable afterwards.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if protocol violation
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::WaitingForHeader => {
                if self.buffer.len() < FRAME_HEADER_SIZE {
                    return Ok(None);
                }

                let mut head = self.buffer.split_to(FRAME_HEADER_SIZE);
                let header = PendingHeader {
                    frame_type: head.get_u8(),
                    channel_id: head.get_u16(),
                    size: head.get_u32(),
                };

                if header.size > self.max_frame_size {
                    tracing::warn!(
                        channel = header.channel_id,
                        size = header.size,
                        max = self.max_frame_size,
                        "Rejecting oversized frame"
                    );
                    return Err(CodecError::FrameTooLarge {
                        size: header.size,
                        max: self.max_frame_size,
                    });
                }

                self.state = State::WaitingForPayload(header);
                self.try_extract_one()
            }

            State::WaitingForPayload(header) => {
                let needed = header.size as usize + 1;
                if self.buffer.len() < needed {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(header.size as usize).freeze();
                let end = self.buffer.get_u8();
                self.state = State::WaitingForHeader;

                if end != FRAME_END {
                    tracing::warn!(
                        channel = header.channel_id,
                        end,
                        "Rejecting frame with invalid frame end"
                    );
                    return Err(CodecError::InvalidFrameEnd(end));
                }

                Ok(Some(Frame::new(header.channel_id, header.frame_type, payload)))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload(_) => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
