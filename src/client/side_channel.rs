//! Side channel
//!
//! The pipe a client process inherits from its supervisor. Every line a
//! bridge displays locally is also written here, NUL-terminated, so the
//! supervisor's relay loop mirrors exactly what the bridge shows.

use std::fs::File;
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use crate::error::Result;
use crate::protocol::SIDE_CHANNEL_SEP;

/// Write end of the supervisor pipe, single-writer by contract
pub struct SideChannel {
    pipe: File,
}

impl SideChannel {
    /// Adopt the write end of an already-open pipe.
    pub fn new(fd: OwnedFd) -> Self {
        Self { pipe: File::from(fd) }
    }

    /// Adopt the pipe fd a supervisor passed on the command line.
    ///
    /// # Safety
    ///
    /// `fd` must be an open, writable file descriptor that nothing else in
    /// this process owns; the channel takes ownership and closes it on drop.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self {
            pipe: File::from_raw_fd(fd),
        }
    }

    /// The underlying fd number, as shown in the startup banner
    pub fn raw_fd(&self) -> RawFd {
        self.pipe.as_raw_fd()
    }

    /// Mirror one displayed line to the supervisor, NUL-framed
    pub fn send(&mut self, line: &str) -> Result<()> {
        self.pipe.write_all(line.as_bytes())?;
        self.pipe.write_all(&[SIDE_CHANNEL_SEP])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::pipe;
    use std::io::Read;

    #[test]
    fn test_send_frames_lines_with_nul() {
        let (rx, tx) = pipe().unwrap();
        let mut channel = SideChannel::new(tx);

        channel.send("first line\n").unwrap();
        channel.send("second line\n").unwrap();
        drop(channel);

        let mut mirrored = Vec::new();
        File::from(rx).read_to_end(&mut mirrored).unwrap();
        assert_eq!(mirrored, b"first line\n\0second line\n\0");
    }
}
