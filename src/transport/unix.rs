//! Unix domain socket transport.
//!
//! The radio daemon exposes a seqpacket-free stream socket (e.g.
//! `/dev/socket/rild`); this transport wraps a connected `UnixStream` and a
//! self-pipe. `recv` blocks in `poll(2)` on both descriptors, so a waker on
//! any thread can interrupt the read by writing one byte to the pipe.

use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{RecvOutcome, Transport, TransportWaker};

/// Transport over a connected Unix domain socket.
pub struct UnixTransport {
    stream: UnixStream,
    wake_rx: OwnedFd,
    waker: Arc<PipeWaker>,
}

impl UnixTransport {
    /// Connect to a daemon socket path.
    pub fn connect<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let stream = UnixStream::connect(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "connected to daemon socket");
        Self::from_stream(stream)
    }

    /// Wrap an already-connected stream (e.g. a descriptor handed over by
    /// init, or one half of `UnixStream::pair`).
    pub fn from_stream(stream: UnixStream) -> io::Result<Self> {
        let (wake_rx, wake_tx) = wake_pipe()?;
        Ok(Self {
            stream,
            wake_rx,
            waker: Arc::new(PipeWaker { wake_tx }),
        })
    }
}

impl Transport for UnixTransport {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<RecvOutcome> {
        loop {
            let mut fds = [
                libc::pollfd {
                    fd: self.wake_rx.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.stream.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];

            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            // Wake pipe first: shutdown must be prompt even with data queued.
            if fds[0].revents & libc::POLLIN != 0 {
                drain_wake_pipe(&self.wake_rx);
                return Ok(RecvOutcome::Woken);
            }

            if fds[1].revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
                match self.stream.read(buf) {
                    Ok(0) => return Ok(RecvOutcome::Closed),
                    Ok(n) => return Ok(RecvOutcome::Data(n)),
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            }
        }
    }

    fn send_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn waker(&self) -> Arc<dyn TransportWaker> {
        Arc::clone(&self.waker) as Arc<dyn TransportWaker>
    }
}

struct PipeWaker {
    wake_tx: OwnedFd,
}

impl TransportWaker for PipeWaker {
    fn wake(&self) {
        let byte = [1u8];
        let rc = unsafe {
            libc::write(
                self.wake_tx.as_raw_fd(),
                byte.as_ptr() as *const libc::c_void,
                1,
            )
        };
        // EAGAIN means the pipe already holds an unobserved wake; fine.
        if rc < 0 {
            trace!(err = %io::Error::last_os_error(), "wake pipe write failed");
        }
    }
}

/// Create the non-blocking, close-on-exec self-pipe as (read, write) ends.
fn wake_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];

    #[cfg(any(target_os = "linux", target_os = "android"))]
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) };
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };

    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    let (rx, tx) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    for fd in [&rx, &tx] {
        unsafe {
            libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC);
            libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, libc::O_NONBLOCK);
        }
    }

    Ok((rx, tx))
}

/// Consume all pending wake bytes so one `Woken` covers coalesced wakes.
fn drain_wake_pipe(fd: &OwnedFd) {
    let mut scratch = [0u8; 64];
    loop {
        let rc = unsafe {
            libc::read(
                fd.as_raw_fd(),
                scratch.as_mut_ptr() as *mut libc::c_void,
                scratch.len(),
            )
        };
        if rc > 0 {
            continue;
        }
        if rc < 0 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
            continue;
        }
        // 0 (no writer) or EAGAIN: pipe is drained.
        break;
    }
}
