//! Protocol Module
//!
//! The (deliberately tiny) wire-level knowledge shared by server and
//! clients: well-known ports, buffer sizes, the time service's push string
//! and the startup banner a client mirrors to its supervisor.
//!
//! ## Wire Format
//!
//! - Echo service: raw byte stream, no framing; every byte sequence read is
//!   written back verbatim, in arrival order.
//! - Time service: the server pushes `"<24-char timestamp>\r\n"` after
//!   every quiet interval; anything the client sends is ignored.
//! - Side channel (client → supervisor pipe): each displayed line followed
//!   by a single NUL byte.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

// =============================================================================
// Well-Known Constants
// =============================================================================

/// Default TCP port of the echo service
pub const DEFAULT_ECHO_PORT: u16 = 61173;

/// Default TCP port of the time service
pub const DEFAULT_TIME_PORT: u16 = 61174;

/// Read buffer size used by session handlers and bridges (bytes)
pub const IO_BUFFER_SIZE: usize = 1024;

/// Quiet period after which the time service pushes a timestamp
pub const PUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Frame separator on the side-channel pipe
pub const SIDE_CHANNEL_SEP: u8 = 0;

// =============================================================================
// Service Kind
// =============================================================================

/// The two services a connection can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Echo,
    Time,
}

impl ServiceKind {
    /// Human-readable service name, as used in logs and banners
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::Echo => "Echo",
            ServiceKind::Time => "Time",
        }
    }

    /// The well-known port of this service
    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Echo => DEFAULT_ECHO_PORT,
            ServiceKind::Time => DEFAULT_TIME_PORT,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Time Service Push String
// =============================================================================

/// Format a timestamp the way the time service pushes it: the 24-character
/// `ctime(3)` form (`"Thu Sep 29 23:06:19 2015"`) plus CRLF.
pub fn format_timestamp(now: DateTime<Local>) -> String {
    // %e is space-padded, matching ctime's fixed 24-character width
    format!("{}\r\n", now.format("%a %b %e %H:%M:%S %Y"))
}

/// The push string for the current wall-clock time
pub fn timestamp_line() -> String {
    format_timestamp(Local::now())
}

// =============================================================================
// Client Startup Banner
// =============================================================================

/// The identification line a client process writes to its own stdout and to
/// the supervisor pipe before entering its loop.
pub fn banner(kind: ServiceKind, addr: &str, port: u16, pipe_fd: i32) -> String {
    format!("{} Service [{}:{}] @ pipe[{}]\n", kind, addr, port, pipe_fd)
}
