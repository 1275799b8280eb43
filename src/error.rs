//! Error types for EchoTime
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using EchoTimeError
pub type Result<T> = std::result::Result<T, EchoTimeError>;

/// Unified error type for EchoTime operations
#[derive(Debug, Error)]
pub enum EchoTimeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("system call failed: {0}")]
    Sys(#[from] nix::errno::Errno),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("failed to bind {service} listener on {addr}: {source}")]
    Bind {
        service: &'static str,
        addr: String,
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Peer closed the connection at a point where the protocol still
    /// expected it to be talking.
    #[error("{0}: server terminated prematurely")]
    ServerDisconnected(&'static str),

    // -------------------------------------------------------------------------
    // Process Errors
    // -------------------------------------------------------------------------
    #[error("usage error: {0}")]
    Usage(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}
