//! Client Module
//!
//! The client-side subsystem: bridges that relay between a local terminal
//! and a service socket, the NUL-framed side channel that mirrors displayed
//! output to a supervising process, and the supervisor's relay loop.

mod bridge;
pub mod relay;
mod side_channel;

pub use bridge::{EchoBridge, TimeBridge};
pub use side_channel::SideChannel;
