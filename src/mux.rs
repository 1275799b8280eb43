//! Readiness multiplexer
//!
//! The one blocking primitive every loop in this crate is built on: wait
//! until at least one of a small fixed set of file descriptors is readable,
//! or until an optional timeout elapses.
//!
//! The timeout is supplied fresh on every call, so a caller that loops
//! around [`wait`] gets "re-armed each iteration" semantics for free. The
//! time service relies on that. Interruption by a signal (EINTR) is retried
//! here and never surfaces to callers.

use std::os::fd::BorrowedFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::Result;

/// Outcome of one readiness wait
#[derive(Debug, Clone)]
pub struct Readiness {
    ready: Vec<bool>,
    timed_out: bool,
}

impl Readiness {
    /// True if the wait ended because the timeout elapsed with no fd ready
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// True if the fd at `index` (position in the slice passed to [`wait`])
    /// signaled readiness
    pub fn is_ready(&self, index: usize) -> bool {
        self.ready.get(index).copied().unwrap_or(false)
    }
}

/// Block until at least one of `fds` is readable, or until `timeout`
/// elapses (`None` blocks indefinitely).
///
/// A hung-up or errored fd is reported as ready so the caller's next read
/// observes the EOF or error; that is the same contract `select(2)` gives.
pub fn wait(fds: &[BorrowedFd<'_>], timeout: Option<Duration>) -> Result<Readiness> {
    let poll_timeout = match timeout {
        Some(duration) => PollTimeout::try_from(duration).unwrap_or(PollTimeout::MAX),
        None => PollTimeout::NONE,
    };

    loop {
        let mut poll_fds: Vec<PollFd> = fds
            .iter()
            .map(|fd| PollFd::new(*fd, PollFlags::POLLIN))
            .collect();

        match poll(&mut poll_fds, poll_timeout) {
            Ok(0) => {
                return Ok(Readiness {
                    ready: vec![false; fds.len()],
                    timed_out: true,
                });
            }
            Ok(_) => {
                let wake = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
                let ready = poll_fds
                    .iter()
                    .map(|pfd| pfd.revents().is_some_and(|r| r.intersects(wake)))
                    .collect();
                return Ok(Readiness {
                    ready,
                    timed_out: false,
                });
            }
            // Benign interruption of the blocking wait; retry silently
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
