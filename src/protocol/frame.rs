//! Frame type for complete messages.
//!
//! A frame is one length-prefixed message unit on the wire. The payload is
//! opaque to this crate; parcel decoding belongs to the consumer. Uses
//! `bytes::Bytes` for zero-copy payload sharing.

use bytes::Bytes;

use super::wire_format::{encode_length_prefix, LENGTH_PREFIX_SIZE};

/// A complete, reassembled message from the channel.
///
/// Constructed only by frame extraction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    /// Create a frame from an already-validated payload.
    pub(crate) fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the frame, returning the payload (cheap, zero-copy).
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check for a zero-length payload. Zero-length frames are valid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Build a complete frame as a single byte vector: prefix + payload.
///
/// This is what a peer daemon would put on the wire; the crate's own send
/// path encodes through [`crate::queue::OutgoingQueue`] instead.
///
/// # Example
///
/// ```
/// use rilwire::protocol::build_frame;
///
/// let bytes = build_frame(b"hello");
/// assert_eq!(bytes.len(), 4 + 5);
/// assert_eq!(&bytes[..4], &[0, 0, 0, 5]);
/// ```
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&encode_length_prefix(payload.len() as u32));
    buf.extend_from_slice(payload);
    buf
}
