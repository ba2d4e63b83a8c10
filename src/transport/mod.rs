//! Transport abstraction over the duplex channel to the modem daemon.
//!
//! The worker only needs three things from a channel: a blocking read, a
//! blocking write, and a way to interrupt a pending read from another
//! thread. Injecting the handle (instead of hard-wiring a platform socket)
//! is what makes the worker testable against [`memory::duplex_pair`].

use std::io;
use std::sync::Arc;

pub mod memory;
#[cfg(unix)]
pub mod unix;

pub use memory::{duplex_pair, MemoryTransport};
#[cfg(unix)]
pub use unix::UnixTransport;

/// Outcome of a blocking [`Transport::recv`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// `n` bytes were read into the buffer.
    Data(usize),
    /// A [`TransportWaker`] fired; no bytes were read.
    Woken,
    /// The peer closed the channel cleanly.
    Closed,
}

/// Handle that interrupts a pending `recv` from another thread.
///
/// Waking is best-effort and idempotent: a wake with no pending `recv`
/// makes the next `recv` return [`RecvOutcome::Woken`] promptly.
pub trait TransportWaker: Send + Sync {
    /// Interrupt a pending or upcoming blocking read.
    fn wake(&self);
}

/// A persistent duplex byte channel with interruptible blocking reads.
///
/// The single worker thread owns the transport exclusively; only the waker
/// handle crosses threads.
pub trait Transport: Send + 'static {
    /// Block until bytes arrive, the peer closes, or a waker fires.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<RecvOutcome>;

    /// Write the entire buffer, blocking as needed.
    fn send_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Get a waker for this transport. May be called before the transport
    /// moves onto the worker thread.
    fn waker(&self) -> Arc<dyn TransportWaker>;
}
