//! Pipe Relay Loop
//!
//! Run by the supervisor while a bridge child is active: mirror everything
//! the child writes to its side-channel pipe, and swallow the supervisor's
//! own keystrokes so stray typing in the parent window is inert. A zero
//! read on the pipe means the child has exited.

use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsFd;

use crate::error::Result;
use crate::mux;
use crate::protocol::{IO_BUFFER_SIZE, SIDE_CHANNEL_SEP};

// Slot positions in the readiness wait
const PIPE_SLOT: usize = 0;
const KEYS_SLOT: usize = 1;

/// Relay side-channel output to `out` until the owning bridge exits.
///
/// Pipe frames are NUL-separated lines; each is displayed with a `": "`
/// prefix. Keystrokes are read and discarded. Returns when the child
/// closes the pipe.
pub fn run<P, K>(mut pipe: P, mut keys: K, out: &mut impl Write) -> Result<()>
where
    P: Read + AsFd,
    K: Read + AsFd,
{
    let mut buf = vec![0u8; IO_BUFFER_SIZE];
    let mut keys_open = true;

    loop {
        let (pipe_ready, keys_ready) = if keys_open {
            let readiness = mux::wait(&[pipe.as_fd(), keys.as_fd()], None)?;
            (readiness.is_ready(PIPE_SLOT), readiness.is_ready(KEYS_SLOT))
        } else {
            let readiness = mux::wait(&[pipe.as_fd()], None)?;
            (readiness.is_ready(PIPE_SLOT), false)
        };

        if pipe_ready {
            match pipe.read(&mut buf) {
                // Child closed its end: the bridge is done
                Ok(0) => return Ok(()),
                Ok(n) => {
                    for frame in buf[..n].split(|&b| b == SIDE_CHANNEL_SEP) {
                        if frame.is_empty() {
                            continue;
                        }
                        out.write_all(b": ")?;
                        out.write_all(frame)?;
                    }
                    out.flush()?;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if keys_ready {
            match keys.read(&mut buf) {
                // Keystroke source gone; stop watching it so a permanently
                // readable EOF fd cannot spin the loop
                Ok(0) => keys_open = false,
                Ok(_) => {
                    tracing::trace!("discarding supervisor keystrokes");
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}
