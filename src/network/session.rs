//! Session Handlers
//!
//! Per-connection service loops. Each accepted connection is owned by
//! exactly one handler invocation on its own thread; the socket closes by
//! drop when the handler returns, on every exit path.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsFd;
use std::time::Duration;

use crate::error::{EchoTimeError, Result};
use crate::mux;
use crate::protocol::{self, ServiceKind};

/// Run the session handler for one accepted connection.
///
/// Errors are contained here: a failing connection is logged and dropped
/// without disturbing the dispatcher or other sessions.
pub fn serve(
    kind: ServiceKind,
    stream: TcpStream,
    peer: SocketAddr,
    push_interval: Duration,
    buffer_size: usize,
) {
    tracing::info!("{} service connected from {}", kind, peer);

    let result = match kind {
        ServiceKind::Echo => serve_echo(&stream, buffer_size),
        ServiceKind::Time => serve_time(&stream, push_interval, buffer_size),
    };

    match result {
        Ok(()) => {
            tracing::info!("{} service finished for {} (peer closed)", kind, peer);
        }
        Err(EchoTimeError::Io(ref e))
            if matches!(
                e.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) =>
        {
            tracing::debug!("{} service connection reset by {}", kind, peer);
        }
        Err(e) => {
            tracing::warn!("{} service error for {}: {}", kind, peer, e);
        }
    }
    // stream drops here, closing the socket
}

/// Echo service loop: read up to one buffer of bytes and write them all
/// back before reading again. There is no framing; chunk boundaries are
/// whatever TCP delivered.
pub fn serve_echo(stream: &TcpStream, buffer_size: usize) -> Result<()> {
    let mut buf = vec![0u8; buffer_size];

    loop {
        match (&*stream).read(&mut buf) {
            // Orderly close by the peer ends the session normally
            Ok(0) => return Ok(()),
            Ok(n) => (&*stream).write_all(&buf[..n])?,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Time service loop: wait for readability with a fixed timeout, re-armed
/// every iteration. A quiet interval pushes one timestamp line; incoming
/// payload is read and discarded (the protocol defines no client request),
/// and a zero read means the peer is gone.
pub fn serve_time(
    stream: &TcpStream,
    push_interval: Duration,
    buffer_size: usize,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size];

    loop {
        let readiness = mux::wait(&[stream.as_fd()], Some(push_interval))?;

        if readiness.timed_out() {
            let line = protocol::timestamp_line();
            (&*stream).write_all(line.as_bytes())?;
            continue;
        }

        match (&*stream).read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                tracing::trace!("time service discarding {} bytes of payload", n);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
