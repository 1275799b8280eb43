//! Client Bridges
//!
//! The loops a client process runs between its local terminal and a
//! service socket. The echo bridge is the interesting one: a two-phase
//! state machine whose half-close shutdown guarantees that replies still in
//! flight from the server are drained before the process exits.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::AsFd;

use crate::client::SideChannel;
use crate::error::{EchoTimeError, Result};
use crate::mux;

// Slot positions in the readiness wait
const SOCKET_SLOT: usize = 0;
const INPUT_SLOT: usize = 1;

// =============================================================================
// Echo Bridge
// =============================================================================

/// Bidirectional relay between a local line-input source and the echo
/// service.
///
/// While input is open (`Active`), both the input source and the socket are
/// monitored. End-of-input half-closes the socket's write direction and
/// drops the input source from the wait set (`Draining`); the socket keeps
/// being serviced until the server's own close confirms that every
/// outstanding reply has been delivered. The `input_closed` flag is never
/// unset.
pub struct EchoBridge<I: Read + AsFd> {
    input: BufReader<I>,
    socket: TcpStream,
    socket_reader: BufReader<TcpStream>,
    side: Option<SideChannel>,
    input_closed: bool,
}

impl<I: Read + AsFd> EchoBridge<I> {
    pub fn new(stream: TcpStream, input: I, side: Option<SideChannel>) -> Result<Self> {
        let socket_reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            input: BufReader::new(input),
            socket: stream,
            socket_reader,
            side,
            input_closed: false,
        })
    }

    /// Drive the bridge until normal completion (end-of-input followed by
    /// server close) or a fatal error. Every line read from the socket is
    /// written to `out` prefixed with `"< "` and mirrored raw to the side
    /// channel.
    pub fn run(&mut self, out: &mut impl Write) -> Result<()> {
        loop {
            let (socket_ready, input_ready) = self.wait_ready()?;

            if socket_ready {
                let mut line = String::new();
                if self.socket_reader.read_line(&mut line)? == 0 {
                    if self.input_closed {
                        // Draining finished: the server saw our half-close
                        // and closed its side in turn
                        return Ok(());
                    }
                    return Err(EchoTimeError::ServerDisconnected("echo bridge"));
                }
                write!(out, "< {}", line)?;
                out.flush()?;
                if let Some(side) = &mut self.side {
                    side.send(&line)?;
                }
            }

            if input_ready {
                let mut line = String::new();
                if self.input.read_line(&mut line)? == 0 {
                    // End of local input: half-close so the server learns no
                    // more requests are coming, then keep draining replies
                    self.input_closed = true;
                    self.socket.shutdown(Shutdown::Write)?;
                    tracing::debug!("input closed, draining remaining replies");
                } else {
                    self.socket.write_all(line.as_bytes())?;
                }
            }
        }
    }

    /// The side channel, if one is attached. Lets the owning process
    /// mirror a fatal diagnostic to the supervisor before exiting.
    pub fn side_mut(&mut self) -> Option<&mut SideChannel> {
        self.side.as_mut()
    }

    /// Readiness for (socket, input). Data already buffered inside either
    /// reader is invisible to poll(2), so it short-circuits the wait.
    fn wait_ready(&mut self) -> Result<(bool, bool)> {
        let socket_buffered = !self.socket_reader.buffer().is_empty();
        let input_buffered = !self.input_closed && !self.input.buffer().is_empty();
        if socket_buffered || input_buffered {
            return Ok((socket_buffered, input_buffered));
        }

        if self.input_closed {
            let readiness = mux::wait(&[self.socket_reader.get_ref().as_fd()], None)?;
            Ok((readiness.is_ready(SOCKET_SLOT), false))
        } else {
            let readiness = mux::wait(
                &[
                    self.socket_reader.get_ref().as_fd(),
                    self.input.get_ref().as_fd(),
                ],
                None,
            )?;
            Ok((
                readiness.is_ready(SOCKET_SLOT),
                readiness.is_ready(INPUT_SLOT),
            ))
        }
    }
}

// =============================================================================
// Time Bridge
// =============================================================================

/// One-directional relay from the time service to the local display.
///
/// The service pushes indefinitely, so a server close is never a normal end
/// here; it is always reported as a premature termination.
pub struct TimeBridge {
    reader: BufReader<TcpStream>,
    side: Option<SideChannel>,
}

impl TimeBridge {
    pub fn new(stream: TcpStream, side: Option<SideChannel>) -> Self {
        Self {
            reader: BufReader::new(stream),
            side,
        }
    }

    /// The side channel, if one is attached. Lets the owning process
    /// mirror a fatal diagnostic to the supervisor before exiting.
    pub fn side_mut(&mut self) -> Option<&mut SideChannel> {
        self.side.as_mut()
    }

    /// Read pushed lines until the server closes or errors.
    pub fn run(&mut self, out: &mut impl Write) -> Result<()> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(EchoTimeError::ServerDisconnected("time bridge"));
            }
            out.write_all(line.as_bytes())?;
            out.flush()?;
            if let Some(side) = &mut self.side {
                side.send(&line)?;
            }
        }
    }
}
