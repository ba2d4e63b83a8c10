//! # rilwire
//!
//! Message transport for radio-interface-layer (RIL) daemon channels.
//!
//! Frames variable-length binary messages over a persistent duplex channel
//! (typically a Unix domain socket to the modem daemon), decouples the
//! blocking hardware I/O thread from the consumer thread, and guarantees
//! in-order delivery in both directions. Payloads are opaque; parcel
//! decoding belongs to the consumer.
//!
//! ## Architecture
//!
//! - **Wire format**: 4-byte big-endian length prefix + payload
//! - **Worker**: one dedicated thread per channel performs all blocking
//!   reads and writes
//! - **Consumer**: drains a [`ChannelEvent`] receiver on its own context
//!   and enqueues outgoing payloads with a non-blocking `send`
//!
//! ## Example
//!
//! ```no_run
//! use rilwire::transport::UnixTransport;
//! use rilwire::worker::{ChannelEvent, ChannelWorker, Config};
//!
//! let transport = UnixTransport::connect("/dev/socket/rild")?;
//! let (worker, events) = ChannelWorker::new(transport, Config::default());
//! worker.start()?;
//! worker.send(b"\x00\x00\x00\x01")?;
//!
//! for event in events {
//!     match event {
//!         ChannelEvent::Frame(frame) => println!("parcel: {} bytes", frame.len()),
//!         ChannelEvent::Closed(err) => {
//!             eprintln!("channel closed: {err}");
//!             break;
//!         }
//!     }
//! }
//! worker.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod protocol;
pub mod queue;
pub mod transport;
pub mod worker;

pub use error::{Result, RilwireError};
pub use protocol::{Frame, FrameBuffer};
pub use worker::{ChannelEvent, ChannelWorker, Config, WorkerState};
