//! Configuration for EchoTime
//!
//! Centralized configuration with sensible defaults.

use std::net::IpAddr;
use std::time::Duration;

use crate::protocol::{DEFAULT_ECHO_PORT, DEFAULT_TIME_PORT, IO_BUFFER_SIZE, PUSH_INTERVAL};

/// Main configuration for an EchoTime server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Address both listeners bind to
    pub bind_addr: IpAddr,

    /// TCP port for the echo service
    pub echo_port: u16,

    /// TCP port for the time service
    pub time_port: u16,

    // -------------------------------------------------------------------------
    // Time Service Configuration
    // -------------------------------------------------------------------------
    /// Quiet period after which the time service pushes a timestamp.
    /// Re-armed on every loop iteration, not an absolute deadline.
    pub push_interval: Duration,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Read buffer size for session handlers (bytes)
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            echo_port: DEFAULT_ECHO_PORT,
            time_port: DEFAULT_TIME_PORT,
            push_interval: PUSH_INTERVAL,
            buffer_size: IO_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the address the listeners bind to
    pub fn bind_addr(mut self, addr: impl Into<IpAddr>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// Set the echo service port
    pub fn echo_port(mut self, port: u16) -> Self {
        self.config.echo_port = port;
        self
    }

    /// Set the time service port
    pub fn time_port(mut self, port: u16) -> Self {
        self.config.time_port = port;
        self
    }

    /// Set the time service push interval
    pub fn push_interval(mut self, interval: Duration) -> Self {
        self.config.push_interval = interval;
        self
    }

    /// Set the session read buffer size (in bytes)
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
