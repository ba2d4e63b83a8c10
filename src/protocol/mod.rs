//! Protocol module - wire format, framing, and frame types.
//!
//! Implements the binary framing for the modem channel:
//! - 4-byte big-endian length prefix encoding/decoding
//! - Frame buffer for accumulating partial reads
//! - Opaque frame type handed to the consumer

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    decode_length_prefix, encode_length_prefix, validate_frame_length, DEFAULT_MAX_FRAME_SIZE,
    LENGTH_PREFIX_SIZE,
};
