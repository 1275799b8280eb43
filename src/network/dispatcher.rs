//! Listener Dispatcher
//!
//! Binds the echo and time listening sockets and runs the accept loop:
//! block until at least one listener has a pending connection, accept it,
//! and hand the new connection to a detached session-handler thread of the
//! matching kind. Neither listener can starve the other because both are
//! re-registered and both readiness flags are checked on every iteration.

use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsFd;
use std::thread;

use crate::config::Config;
use crate::error::{EchoTimeError, Result};
use crate::mux;
use crate::network::session;
use crate::protocol::ServiceKind;

// Slot positions in the readiness wait
const ECHO_SLOT: usize = 0;
const TIME_SLOT: usize = 1;

/// The server's accept loop over both service ports
pub struct Dispatcher {
    echo_listener: TcpListener,
    time_listener: TcpListener,
    echo_addr: SocketAddr,
    time_addr: SocketAddr,
    config: Config,
}

impl Dispatcher {
    /// Bind both listeners. Failure here is process-fatal by design: a
    /// server that cannot offer one of its two services is not worth
    /// starting.
    pub fn bind(config: Config) -> Result<Self> {
        let echo_listener = TcpListener::bind((config.bind_addr, config.echo_port)).map_err(
            |source| EchoTimeError::Bind {
                service: "echo",
                addr: format!("{}:{}", config.bind_addr, config.echo_port),
                source,
            },
        )?;
        let time_listener = TcpListener::bind((config.bind_addr, config.time_port)).map_err(
            |source| EchoTimeError::Bind {
                service: "time",
                addr: format!("{}:{}", config.bind_addr, config.time_port),
                source,
            },
        )?;

        // Nonblocking accept: if a peer aborts its handshake between the
        // readiness wake-up and the accept call, the loop moves on instead
        // of stalling both services until the next connection arrives
        echo_listener.set_nonblocking(true)?;
        time_listener.set_nonblocking(true)?;

        let echo_addr = echo_listener.local_addr()?;
        let time_addr = time_listener.local_addr()?;

        Ok(Self {
            echo_listener,
            time_listener,
            echo_addr,
            time_addr,
            config,
        })
    }

    /// Actual bound address of the echo listener (useful when binding port 0)
    pub fn echo_addr(&self) -> SocketAddr {
        self.echo_addr
    }

    /// Actual bound address of the time listener
    pub fn time_addr(&self) -> SocketAddr {
        self.time_addr
    }

    /// Run the accept loop. Never returns under normal operation; the
    /// listeners live for the process lifetime.
    pub fn run(&self) -> Result<()> {
        tracing::info!("EchoTime server started");
        tracing::info!("Echo service listening on {}", self.echo_addr);
        tracing::info!("Time service listening on {}", self.time_addr);

        loop {
            let readiness = mux::wait(
                &[self.echo_listener.as_fd(), self.time_listener.as_fd()],
                None,
            )?;

            if readiness.is_ready(ECHO_SLOT) {
                self.accept_and_spawn(&self.echo_listener, ServiceKind::Echo);
            }
            if readiness.is_ready(TIME_SLOT) {
                self.accept_and_spawn(&self.time_listener, ServiceKind::Time);
            }
        }
    }

    /// Accept one pending connection and spawn its handler thread. The
    /// thread is detached: the dispatcher keeps no handle to it, and the
    /// handler owns the connection until it returns.
    fn accept_and_spawn(&self, listener: &TcpListener, kind: ServiceKind) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => return,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return,
            Err(e) => {
                // Transient accept failure (e.g. the peer aborted during the
                // handshake); the listener itself is still healthy.
                tracing::warn!("{} service accept failed: {}", kind, e);
                return;
            }
        };

        // Some platforms hand the accepted socket the listener's nonblocking
        // mode; session handlers expect blocking reads
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("{} service setup failed for {}: {}", kind, peer, e);
            return;
        }

        let push_interval = self.config.push_interval;
        let buffer_size = self.config.buffer_size;
        thread::spawn(move || session::serve(kind, stream, peer, push_interval, buffer_size));
    }
}
