//! Echo Service Client Binary
//!
//! Normally spawned by `echotime-client` in its own terminal window, with
//! the write end of the supervisor pipe passed as the second argument.

use std::io::{self, Write};
use std::net::TcpStream;
use std::os::fd::RawFd;

use clap::Parser;
use echotime::client::{EchoBridge, SideChannel};
use echotime::error::EchoTimeError;
use echotime::protocol::{self, ServiceKind, DEFAULT_ECHO_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// Echo Service client (spawned by echotime-client)
#[derive(Parser, Debug)]
#[command(name = "echo-cli")]
#[command(about = "Interactive client for the EchoTime echo service")]
struct Args {
    /// Server address (IP or hostname)
    server: String,

    /// Write end of the supervisor pipe, inherited across exec
    pipe_fd: RawFd,

    /// Echo service port
    #[arg(long, default_value_t = DEFAULT_ECHO_PORT)]
    port: u16,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("echo-cli: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> echotime::Result<()> {
    let addr = format!("{}:{}", args.server, args.port);
    let stream = TcpStream::connect(&addr).map_err(|source| EchoTimeError::Connect {
        addr: addr.clone(),
        source,
    })?;

    // Safety: the supervisor opened this fd for us and nothing else in this
    // process touches it
    let mut side = unsafe { SideChannel::from_raw_fd(args.pipe_fd) };

    // Identification line, shown in both this window and the supervisor's
    let banner = protocol::banner(ServiceKind::Echo, &args.server, args.port, args.pipe_fd);
    let mut stdout = io::stdout();
    stdout.write_all(banner.as_bytes())?;
    stdout.flush()?;
    side.send(&banner)?;

    let mut bridge = EchoBridge::new(stream, io::stdin(), Some(side))?;
    if let Err(e) = bridge.run(&mut stdout) {
        // This window closes the moment the process exits; mirror the
        // diagnostic so the supervisor's relay shows it too
        if let Some(side) = bridge.side_mut() {
            let _ = side.send(&format!("echo-cli: {}\n", e));
        }
        return Err(e);
    }
    Ok(())
}
