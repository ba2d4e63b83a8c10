//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management and a small state machine
//! for fragmented frames:
//! - `WaitingForLength`: need at least 4 prefix bytes
//! - `WaitingForPayload`: prefix parsed, need N more payload bytes
//!
//! Owned exclusively by the worker's read loop, so no internal locking.
//!
//! # Example
//!
//! ```
//! use rilwire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//!
//! // Data arrives in arbitrary chunks from the socket
//! let frames = buffer.push(&[0, 0, 0, 2, b'h', b'i']).unwrap();
//! assert_eq!(frames[0].payload(), b"hi");
//! ```

use bytes::BytesMut;

use super::wire_format::{
    decode_length_prefix, validate_frame_length, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE,
};
use super::Frame;
use crate::error::Result;

/// Initial buffer capacity, sized for typical RIL parcels.
const INITIAL_CAPACITY: usize = 1024;

/// Parse state across fragmented reads.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for a complete 4-byte length prefix.
    WaitingForLength,
    /// Prefix parsed and validated; waiting for the payload bytes.
    WaitingForPayload { length: u32 },
}

/// Buffer that turns an arbitrarily chunked byte stream into complete frames.
///
/// The buffer only ever shrinks by exactly the bytes of extracted frames;
/// capacity grows geometrically via `BytesMut`.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed frame payload size.
    max_frame_size: u32,
}

impl FrameBuffer {
    /// Create a frame buffer with the default maximum frame size.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a frame buffer with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
            state: State::WaitingForLength,
            max_frame_size,
        }
    }

    /// Append raw bytes without extracting frames.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract a single complete frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was removed from the buffer
    /// - `Ok(None)` if more data is needed (not an error)
    /// - `Err(FrameTooLarge)` if the declared length exceeds the maximum;
    ///   the channel must be torn down, no further extraction is meaningful
    ///
    /// Call repeatedly until `Ok(None)`: one read may complete several frames.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::WaitingForLength => {
                    let Some(length) = decode_length_prefix(&self.buffer) else {
                        return Ok(None);
                    };

                    validate_frame_length(length, self.max_frame_size)?;

                    let _ = self.buffer.split_to(LENGTH_PREFIX_SIZE);

                    if length == 0 {
                        // Zero-length frames are valid and complete here.
                        return Ok(Some(Frame::new(bytes::Bytes::new())));
                    }

                    self.state = State::WaitingForPayload { length };
                }

                State::WaitingForPayload { length } => {
                    let length = length as usize;
                    if self.buffer.len() < length {
                        return Ok(None);
                    }

                    let payload = self.buffer.split_to(length).freeze();
                    self.state = State::WaitingForLength;

                    return Ok(Some(Frame::new(payload)));
                }
            }
        }
    }

    /// Append data and extract every complete frame in one call.
    ///
    /// Returns the frames in wire order; the vector may be empty while the
    /// buffer is still waiting for data.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.extend(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Number of buffered bytes not yet part of an extracted frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForLength => "WaitingForLength",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RilwireError;
    use crate::protocol::build_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&build_frame(b"hello")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = build_frame(b"first");
        combined.extend_from_slice(&build_frame(b"second"));
        combined.extend_from_slice(&build_frame(b"third"));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[1].payload(), b"second");
        assert_eq!(frames[2].payload(), b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_prefix() {
        let mut buffer = FrameBuffer::new();
        let frame_bytes = build_frame(b"test");

        // Push only 2 of the 4 prefix bytes
        let frames = buffer.push(&frame_bytes[..2]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForLength");

        let frames = buffer.push(&frame_bytes[2..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"test");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = b"this is a longer payload that will be fragmented";
        let frame_bytes = build_frame(payload);

        let partial_len = LENGTH_PREFIX_SIZE + 10;
        let frames = buffer.push(&frame_bytes[..partial_len]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        let frames = buffer.push(&frame_bytes[partial_len..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &payload[..]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_length_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&build_frame(b"")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_two_frames_split_across_three_appends() {
        // "A" then "BB", chunked without regard for frame boundaries.
        let mut wire = build_frame(b"A");
        wire.extend_from_slice(&build_frame(b"BB"));
        assert_eq!(wire.len(), 11);

        let mut buffer = FrameBuffer::new();
        let mut frames = Vec::new();

        buffer.extend(&wire[..3]);
        buffer.extend(&wire[3..7]);
        buffer.extend(&wire[7..]);

        while let Some(frame) = buffer.next_frame().unwrap() {
            frames.push(frame);
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload(), b"A");
        assert_eq!(frames[1].payload(), b"BB");
        assert!(buffer.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_chunking_invariance_byte_at_a_time() {
        let mut wire = build_frame(b"hi");
        wire.extend_from_slice(&build_frame(b"there"));

        let mut buffer = FrameBuffer::new();
        let mut all_frames = Vec::new();

        for byte in &wire {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 2);
        assert_eq!(all_frames[0].payload(), b"hi");
        assert_eq!(all_frames[1].payload(), b"there");
    }

    #[test]
    fn test_frame_too_large_is_fatal() {
        let mut buffer = FrameBuffer::with_max_frame_size(100);

        // Prefix declaring 1000 bytes, over the 100-byte limit
        let result = buffer.push(&1000u32.to_be_bytes());

        match result {
            Err(RilwireError::FrameTooLarge { length, max }) => {
                assert_eq!(length, 1000);
                assert_eq!(max, 100);
            }
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }

        // The poisoned prefix stays put; extraction keeps failing rather
        // than resynchronizing on garbage.
        assert!(buffer.next_frame().is_err());
    }

    #[test]
    fn test_frame_at_exact_maximum() {
        let mut buffer = FrameBuffer::with_max_frame_size(8);
        let frames = buffer.push(&build_frame(b"12345678")).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 8);
    }

    #[test]
    fn test_large_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = vec![0xAB; 1024 * 1024];
        let frames = buffer.push(&build_frame(&payload)).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 1024 * 1024);
        assert!(frames[0].payload().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let frame1 = build_frame(b"first");
        let frame2 = build_frame(b"second");

        let mut data = frame1.clone();
        data.extend_from_slice(&frame2[..3]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"first");

        let frames = buffer.push(&frame2[3..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"second");
    }

    #[test]
    fn test_no_bytes_lost_or_duplicated() {
        // Concatenate many frames, split the stream at every possible point,
        // and verify the reassembled sequence is identical.
        let payloads: Vec<Vec<u8>> = (0u8..20).map(|i| vec![i; i as usize]).collect();
        let mut wire = Vec::new();
        for p in &payloads {
            wire.extend_from_slice(&build_frame(p));
        }

        for split in 0..=wire.len() {
            let mut buffer = FrameBuffer::new();
            let mut frames = buffer.push(&wire[..split]).unwrap();
            frames.extend(buffer.push(&wire[split..]).unwrap());

            assert_eq!(frames.len(), payloads.len(), "split at {split}");
            for (frame, expected) in frames.iter().zip(&payloads) {
                assert_eq!(frame.payload(), &expected[..]);
            }
            assert!(buffer.is_empty());
        }
    }
}
