//! Frame encoding and decoding for the LPF2 protocol.
//!
//! Every notification and every write on the hub characteristic is one frame:
//! ```text
//! ┌──────────┬──────────┬──────────────┬─────────────────┐
//! │  length  │   0x00   │ message type │    payload      │
//! │  1 byte  │  1 byte  │    1 byte    │ length-3 bytes  │
//! └──────────┴──────────┴──────────────┴─────────────────┘
//! ```
//!
//! Frames longer than 127 bytes would need the escaped two-byte length
//! encoding, which hubs never send for the traffic handled here.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::protocol::message::MessageType;

/// Size of the common header (length, hub id, message type).
pub const HEADER_SIZE: usize = 3;

/// Maximum total frame size representable with a single length byte.
pub const MAX_FRAME_SIZE: usize = 127;

/// Maximum payload size.
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - HEADER_SIZE;

/// A single LPF2 frame.
///
/// Cloning is cheap; the bytes are reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Returns the length byte.
    #[must_use]
    pub fn length(&self) -> u8 {
        self.bytes[0]
    }

    /// Returns the raw message type byte.
    #[must_use]
    pub fn message_type_byte(&self) -> u8 {
        self.bytes[2]
    }

    /// Returns the typed message type, if known.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_byte(self.message_type_byte())
    }

    /// Returns the payload following the header.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    /// Returns the full frame bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consumes the frame and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Encodes a message into a frame.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] if the frame would exceed [`MAX_FRAME_SIZE`].
pub fn encode(message_type: MessageType, payload: &[u8]) -> Result<Frame, FrameError> {
    let size = HEADER_SIZE + payload.len();
    if size > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            size,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(size);
    buf.put_u8(size as u8);
    buf.put_u8(0x00);
    buf.put_u8(message_type as u8);
    buf.put_slice(payload);
    Ok(Frame { bytes: buf.freeze() })
}

/// Wraps a received notification as a frame without copying.
///
/// The length byte is taken as received and is not checked against the
/// buffer size.
///
/// # Errors
///
/// Returns [`FrameError::TooShort`] if the buffer cannot hold the header.
pub fn decode(bytes: Bytes) -> Result<Frame, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::TooShort(bytes.len()));
    }
    Ok(Frame { bytes })
}
