//! Outgoing request queue.
//!
//! Producers on any thread enqueue payloads; the single worker drains the
//! queue and writes each request to the transport. Order is the global FIFO
//! order of `enqueue` calls, regardless of enqueuing thread, because exactly
//! one worker drains.
//!
//! The length prefix is encoded at enqueue time so the worker can hand each
//! request to the transport as one contiguous write.

use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;

use crate::protocol::{encode_length_prefix, LENGTH_PREFIX_SIZE};

/// A pending write: length prefix plus payload, pre-encoded contiguously.
///
/// Owned exclusively by the worker once taken out of the queue; dropped
/// after the write completes or fails.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    frame: Bytes,
}

impl OutgoingRequest {
    fn new(payload: &[u8]) -> Self {
        let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        frame.put_slice(&encode_length_prefix(payload.len() as u32));
        frame.put_slice(payload);
        Self {
            frame: frame.freeze(),
        }
    }

    /// The complete wire bytes: prefix followed by payload.
    #[inline]
    pub fn wire_bytes(&self) -> &[u8] {
        &self.frame
    }

    /// Payload length, excluding the prefix.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.frame.len() - LENGTH_PREFIX_SIZE
    }
}

/// Thread-safe FIFO of pending writes.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    pending: Mutex<VecDeque<OutgoingRequest>>,
}

impl OutgoingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload, pre-encoding its length prefix. Never blocks
    /// beyond the internal lock; callable from any thread.
    pub fn enqueue(&self, payload: &[u8]) {
        let request = OutgoingRequest::new(payload);
        self.pending.lock().push_back(request);
    }

    /// Atomically take every request enqueued so far, leaving the queue
    /// empty. Called only by the worker; never blocks on I/O.
    pub fn drain_all(&self) -> Vec<OutgoingRequest> {
        let mut pending = self.pending.lock();
        pending.drain(..).collect()
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Check whether any writes are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
