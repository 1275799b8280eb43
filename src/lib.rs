//! # EchoTime
//!
//! A pair of minimal TCP services with terminal clients:
//! - Echo service: every byte received is written back verbatim
//! - Time service: a timestamp is pushed every few seconds of inactivity
//! - Client bridges: readiness-multiplexed relays between a terminal and a
//!   socket, mirroring displayed output to a supervising process over a pipe
//!
//! ## Architecture Overview
//!
//! ```text
//!                  server process
//! ┌───────────────────────────────────────────────┐
//! │              Listener Dispatcher              │
//! │        (poll over two listening ports)        │
//! └───────────┬───────────────────────┬───────────┘
//!             │ accept                │ accept
//!             ▼                       ▼
//!   ┌──────────────────┐    ┌──────────────────┐
//!   │   Echo Session   │    │   Time Session   │   one detached thread
//!   │   (read → echo)  │    │  (interval push) │   per connection
//!   └──────────────────┘    └──────────────────┘
//!             ▲                       ▲
//!             │ TCP                   │ TCP
//!   ┌──────────────────┐    ┌──────────────────┐
//!   │    Echo Bridge   │    │    Time Bridge   │   client processes
//!   └────────┬─────────┘    └────────┬─────────┘
//!            │                       │
//!            └─── pipe (NUL-framed mirror) ───┐
//!                                             ▼
//!                                  ┌──────────────────┐
//!                                  │  Pipe Relay Loop │   supervisor
//!                                  └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod mux;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EchoTimeError, Result};
pub use config::Config;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EchoTime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
