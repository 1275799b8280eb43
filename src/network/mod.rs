//! Network Module
//!
//! The server subsystem: a dispatcher that multiplexes two listening
//! sockets and per-connection session handlers, one detached thread each.

mod dispatcher;
mod session;

pub use dispatcher::Dispatcher;
pub use session::{serve, serve_echo, serve_time};
