//! In-process duplex transport for tests and simulations.
//!
//! [`duplex_pair`] returns two connected ends; bytes written on one side
//! become readable on the other. Dropping an end is a clean close for the
//! peer, mirroring a socket EOF.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::{RecvOutcome, Transport, TransportWaker};

#[derive(Default)]
struct State {
    /// Bytes in flight toward side `i`.
    inbound: [VecDeque<u8>; 2],
    /// Side `i` has dropped its end.
    closed: [bool; 2],
    /// A waker fired for side `i` and has not been observed yet.
    woken: [bool; 2],
}

struct Shared {
    state: Mutex<State>,
    /// One condvar per reading side.
    readable: [Condvar; 2],
}

/// One end of an in-memory duplex channel.
pub struct MemoryTransport {
    shared: Arc<Shared>,
    side: usize,
}

/// Create a connected pair of in-memory transports.
pub fn duplex_pair() -> (MemoryTransport, MemoryTransport) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::default()),
        readable: [Condvar::new(), Condvar::new()],
    });
    (
        MemoryTransport {
            shared: Arc::clone(&shared),
            side: 0,
        },
        MemoryTransport { shared, side: 1 },
    )
}

impl MemoryTransport {
    fn peer(&self) -> usize {
        1 - self.side
    }
}

impl Transport for MemoryTransport {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<RecvOutcome> {
        let mut state = self.shared.state.lock();
        loop {
            // Wakes take priority so shutdown is prompt even with data queued.
            if state.woken[self.side] {
                state.woken[self.side] = false;
                return Ok(RecvOutcome::Woken);
            }

            if !state.inbound[self.side].is_empty() {
                let queue = &mut state.inbound[self.side];
                let mut n = 0;
                while n < buf.len() {
                    match queue.pop_front() {
                        Some(byte) => {
                            buf[n] = byte;
                            n += 1;
                        }
                        None => break,
                    }
                }
                return Ok(RecvOutcome::Data(n));
            }

            if state.closed[self.peer()] {
                return Ok(RecvOutcome::Closed);
            }

            self.shared.readable[self.side].wait(&mut state);
        }
    }

    fn send_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let peer = self.peer();
        let mut state = self.shared.state.lock();
        if state.closed[peer] {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer end dropped",
            ));
        }
        state.inbound[peer].extend(buf.iter().copied());
        drop(state);
        self.shared.readable[peer].notify_all();
        Ok(())
    }

    fn waker(&self) -> Arc<dyn TransportWaker> {
        Arc::new(MemoryWaker {
            shared: Arc::clone(&self.shared),
            side: self.side,
        })
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.closed[self.side] = true;
        drop(state);
        // Unblock a peer waiting for data it will never get.
        self.shared.readable[0].notify_all();
        self.shared.readable[1].notify_all();
    }
}

struct MemoryWaker {
    shared: Arc<Shared>,
    side: usize,
}

impl TransportWaker for MemoryWaker {
    fn wake(&self) {
        let mut state = self.shared.state.lock();
        state.woken[self.side] = true;
        drop(state);
        self.shared.readable[self.side].notify_all();
    }
}
