//! Channel worker: the dedicated I/O thread for one modem channel.
//!
//! The worker owns the transport and performs the only blocking operations
//! in the crate. The consumer side never blocks: `send` enqueues and wakes,
//! and received frames arrive as [`ChannelEvent`]s on a channel drained by
//! the consumer's own loop.
//!
//! # Architecture
//!
//! ```text
//! consumer thread ──send()──► OutgoingQueue ─┐
//!                                            ├─► worker thread ◄──► transport
//! consumer thread ◄─ChannelEvent── receiver ─┘
//! ```
//!
//! # Example
//!
//! ```
//! use rilwire::transport::duplex_pair;
//! use rilwire::worker::{ChannelEvent, ChannelWorker, Config};
//!
//! let (ours, _peer) = duplex_pair();
//! let (worker, events) = ChannelWorker::new(ours, Config::default());
//! worker.send(b"command").unwrap(); // queued until the worker runs
//! worker.start().unwrap();
//! worker.stop();
//! # drop(events);
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{Result, RilwireError};
use crate::protocol::{Frame, FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
use crate::queue::OutgoingQueue;
use crate::transport::{RecvOutcome, Transport, TransportWaker};

/// Lifecycle state of a [`ChannelWorker`].
///
/// `Created → Started → ShuttingDown → Stopped`; a transport or framing
/// error moves `Started` directly to `Stopped`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Constructed, thread not yet spawned.
    Created = 0,
    /// Worker thread running.
    Started = 1,
    /// Stop requested; waiting for the blocking read to unblock.
    ShuttingDown = 2,
    /// Worker thread has exited. Terminal.
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Started,
            2 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }
}

/// Configuration for a channel worker.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum accepted frame payload size; larger prefixes close the
    /// channel with [`RilwireError::FrameTooLarge`].
    pub max_frame_size: u32,
    /// Size of the scratch buffer handed to each blocking read.
    pub read_chunk_size: usize,
    /// Name given to the spawned worker thread.
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_chunk_size: 1024,
            thread_name: "rilwire-worker".to_string(),
        }
    }
}

/// Notification delivered to the consumer's context.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A complete frame was reassembled. Frames arrive in wire order.
    Frame(Frame),
    /// The channel died; sent exactly once, and only for failures (a
    /// consumer-initiated [`ChannelWorker::stop`] produces no event).
    Closed(RilwireError),
}

/// Owns one worker thread and the transport it reads and writes.
///
/// One instance per channel. The instance is not restartable: after
/// `stop()` (or a transport error) a fresh worker must be constructed.
pub struct ChannelWorker {
    state: Arc<AtomicU8>,
    queue: Arc<OutgoingQueue>,
    waker: Arc<dyn TransportWaker>,
    transport: Mutex<Option<Box<dyn Transport>>>,
    events_tx: Sender<ChannelEvent>,
    handle: Mutex<Option<JoinHandle<()>>>,
    config: Config,
}

impl ChannelWorker {
    /// Create a worker for the given transport.
    ///
    /// Returns the worker plus the event receiver the consumer drains on
    /// its own context. Nothing runs until [`start`](Self::start).
    pub fn new<T: Transport>(transport: T, config: Config) -> (Self, Receiver<ChannelEvent>) {
        let (events_tx, events_rx) = unbounded();
        let waker = transport.waker();
        let worker = Self {
            state: Arc::new(AtomicU8::new(WorkerState::Created as u8)),
            queue: Arc::new(OutgoingQueue::new()),
            waker,
            transport: Mutex::new(Some(Box::new(transport))),
            events_tx,
            handle: Mutex::new(None),
            config,
        };
        (worker, events_rx)
    }

    /// Current lifecycle state (atomic read, callable from any thread).
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Spawn the worker thread.
    ///
    /// Fails with [`RilwireError::AlreadyStarted`] unless the worker is
    /// still in `Created` - including after a stop; the worker is one-shot.
    pub fn start(&self) -> Result<()> {
        self.state
            .compare_exchange(
                WorkerState::Created as u8,
                WorkerState::Started as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| RilwireError::AlreadyStarted)?;

        let transport = self
            .transport
            .lock()
            .take()
            .ok_or(RilwireError::InvalidState("transport already consumed"))?;

        let state = Arc::clone(&self.state);
        let queue = Arc::clone(&self.queue);
        let events = self.events_tx.clone();
        let config = self.config.clone();

        let spawned = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_loop(transport, state, queue, events, config));

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.state
                    .store(WorkerState::Stopped as u8, Ordering::Release);
                Err(RilwireError::Spawn(err))
            }
        }
    }

    /// Queue a payload for writing; callable from any thread, never blocks
    /// on I/O.
    ///
    /// Valid before [`start`](Self::start): queued requests are written as
    /// soon as the worker runs. Writes happen in global enqueue order.
    /// Fails with [`RilwireError::ConnectionClosed`] once the channel is
    /// shutting down or stopped.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        match self.state() {
            WorkerState::ShuttingDown | WorkerState::Stopped => {
                Err(RilwireError::ConnectionClosed)
            }
            WorkerState::Created | WorkerState::Started => {
                self.queue.enqueue(payload);
                // No-op before start; otherwise kicks the worker out of
                // its blocking read so the write goes out promptly.
                self.waker.wake();
                Ok(())
            }
        }
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// Cooperative: wakes the blocking read and joins. Idempotent - a
    /// second call, or a call after an error already stopped the channel,
    /// is a no-op. On a never-started worker it just marks the terminal
    /// state.
    pub fn stop(&self) {
        let _ = self.state.compare_exchange(
            WorkerState::Created as u8,
            WorkerState::Stopped as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        if self
            .state
            .compare_exchange(
                WorkerState::Started as u8,
                WorkerState::ShuttingDown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.waker.wake();
        }

        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for ChannelWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker thread body: write pending requests, block for bytes, feed
/// the frame buffer, dispatch complete frames.
fn run_loop(
    mut transport: Box<dyn Transport>,
    state: Arc<AtomicU8>,
    queue: Arc<OutgoingQueue>,
    events: Sender<ChannelEvent>,
    config: Config,
) {
    let mut frames = FrameBuffer::with_max_frame_size(config.max_frame_size);
    let mut chunk = vec![0u8; config.read_chunk_size.max(1)];
    debug!("channel worker running");

    let result = 'io: loop {
        if state.load(Ordering::Acquire) == WorkerState::ShuttingDown as u8 {
            break 'io Ok(());
        }

        // Drain writes before blocking again, in enqueue order.
        for request in queue.drain_all() {
            trace!(len = request.payload_len(), "writing request");
            if let Err(err) = transport.send_all(request.wire_bytes()) {
                break 'io Err(RilwireError::Write(err));
            }
        }

        match transport.recv(&mut chunk) {
            Ok(RecvOutcome::Data(n)) => {
                frames.extend(&chunk[..n]);
                loop {
                    match frames.next_frame() {
                        Ok(Some(frame)) => {
                            trace!(len = frame.len(), "frame received");
                            if events.send(ChannelEvent::Frame(frame)).is_err() {
                                // Receiver dropped: nobody is listening.
                                break 'io Ok(());
                            }
                        }
                        Ok(None) => break,
                        Err(err) => break 'io Err(err),
                    }
                }
            }
            // A waker fired: re-check shutdown and pending writes.
            Ok(RecvOutcome::Woken) => continue,
            Ok(RecvOutcome::Closed) => break 'io Err(RilwireError::ConnectionClosed),
            Err(err) => break 'io Err(RilwireError::Read(err)),
        }
    };

    // Error paths skip ShuttingDown and land on the terminal state directly.
    state.store(WorkerState::Stopped as u8, Ordering::Release);

    match result {
        Ok(()) => debug!("channel worker stopped"),
        Err(err) => {
            warn!(%err, "channel closed on error");
            let _ = events.send(ChannelEvent::Closed(err));
        }
    }
}
