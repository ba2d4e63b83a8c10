//! Wire format encoding and decoding.
//!
//! Every message on the channel is a length-prefixed frame:
//! ```text
//! ┌───────────┬─────────────────┐
//! │ Length    │ Payload         │
//! │ 4 bytes   │ Length bytes    │
//! │ uint32 BE │                 │
//! └───────────┴─────────────────┘
//! ```
//!
//! The prefix is a big-endian u32 counting only the payload bytes, not the
//! prefix itself. Big endian matches the network byte order used on the rild
//! control socket.

use crate::error::{Result, RilwireError};

/// Length prefix size in bytes (fixed, exactly 4).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum frame payload size (8 MiB).
///
/// Real RIL parcels are a few KiB at most; this bound exists so a corrupted
/// length prefix cannot drive unbounded buffer growth.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 8 * 1024 * 1024;

/// Encode a payload length as a big-endian prefix.
#[inline]
pub fn encode_length_prefix(payload_length: u32) -> [u8; LENGTH_PREFIX_SIZE] {
    payload_length.to_be_bytes()
}

/// Decode a length prefix from bytes (big endian).
///
/// Returns `None` if the buffer is too short.
#[inline]
pub fn decode_length_prefix(buf: &[u8]) -> Option<u32> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return None;
    }
    Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Validate a declared payload length against the configured maximum.
#[inline]
pub fn validate_frame_length(payload_length: u32, max_frame_size: u32) -> Result<()> {
    if payload_length > max_frame_size {
        return Err(RilwireError::FrameTooLarge {
            length: payload_length,
            max: max_frame_size,
        });
    }
    Ok(())
}
