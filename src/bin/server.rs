//! EchoTime Server Binary
//!
//! Binds the echo and time listeners and runs the dispatch loop.

use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;
use echotime::network::Dispatcher;
use echotime::protocol::{DEFAULT_ECHO_PORT, DEFAULT_TIME_PORT};
use echotime::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// EchoTime Server
#[derive(Parser, Debug)]
#[command(name = "echotime-server")]
#[command(about = "TCP echo and periodic-time-broadcast server")]
#[command(version)]
struct Args {
    /// Address to bind both listeners to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Echo service port
    #[arg(long, default_value_t = DEFAULT_ECHO_PORT)]
    echo_port: u16,

    /// Time service port
    #[arg(long, default_value_t = DEFAULT_TIME_PORT)]
    time_port: u16,

    /// Seconds of inactivity before the time service pushes a timestamp
    #[arg(long, default_value_t = 5)]
    push_interval: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,echotime=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("EchoTime Server v{}", echotime::VERSION);

    let config = Config::builder()
        .bind_addr(args.bind)
        .echo_port(args.echo_port)
        .time_port(args.time_port)
        .push_interval(Duration::from_secs(args.push_interval))
        .build();

    // Bind both service ports; failure here aborts before any session starts
    let dispatcher = match Dispatcher::bind(config) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatcher.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
