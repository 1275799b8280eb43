//! EchoTime Supervisor Binary
//!
//! Interactive menu that spawns a service client in a separate terminal
//! window and mirrors its output here through a pipe. The menu reads single
//! keystrokes, so the terminal's canonical mode is switched off for the
//! lifetime of the process and restored on exit.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process::Command;
use std::thread;

use clap::Parser;
use echotime::client::relay;
use echotime::error::EchoTimeError;
use echotime::protocol::ServiceKind;
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use tracing_subscriber::{fmt, EnvFilter};

/// EchoTime Client Supervisor
#[derive(Parser, Debug)]
#[command(name = "echotime-client")]
#[command(about = "Menu-driven launcher for EchoTime service clients")]
#[command(version)]
struct Args {
    /// Server address, passed through to the spawned clients
    server: String,

    /// Terminal emulator used to open a client window
    #[arg(short, long, default_value = "xterm")]
    terminal: String,
}

/// RAII guard that restores the terminal's canonical mode on drop
struct CanonicalModeGuard {
    original: Option<Termios>,
}

impl CanonicalModeGuard {
    fn new() -> Self {
        let stdin = io::stdin();
        Self {
            original: termios::tcgetattr(&stdin).ok(),
        }
    }

    /// Switch to single-keystroke reads: canonical mode off, VMIN = 1
    fn enable_single_key(&self) {
        if let Some(ref original) = self.original {
            let stdin = io::stdin();
            let mut raw = original.clone();
            raw.local_flags.remove(LocalFlags::ICANON);
            raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
            raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
            let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw);
        }
    }
}

impl Drop for CanonicalModeGuard {
    fn drop(&mut self) {
        if let Some(ref original) = self.original {
            let stdin = io::stdin();
            let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, original);
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let guard = CanonicalModeGuard::new();
    guard.enable_single_key();
    let result = menu_loop(&args);
    drop(guard);

    if let Err(e) = result {
        eprintln!("echotime-client: {}", e);
        std::process::exit(1);
    }
    println!("\nGoodbye!");
}

fn menu_loop(args: &Args) -> echotime::Result<()> {
    let mut stdin = io::stdin();

    loop {
        println!("\n= TCP EchoTime Client =");
        println!("1. Echo Service");
        println!("2. Time Service");
        println!("3. Quit");
        print!("\nPlease indicate your choice: > ");
        io::stdout().flush()?;

        let mut key = [0u8; 1];
        if stdin.read(&mut key)? == 0 {
            // End of input behaves like Quit
            return Ok(());
        }

        match key[0] {
            b'1' => run_service(args, ServiceKind::Echo)?,
            b'2' => run_service(args, ServiceKind::Time)?,
            b'3' => return Ok(()),
            b'\n' | b'\r' => {}
            _ => println!("\n\nSorry, wrong input."),
        }
    }
}

/// Spawn one client window and mirror its output until it exits.
fn run_service(args: &Args, kind: ServiceKind) -> echotime::Result<()> {
    let cli_path = cli_binary(kind)?;
    let (pipe_rx, pipe_tx) = nix::unistd::pipe()?;

    println!("\nConnecting to {} Service...", kind);

    let mut child = Command::new(&args.terminal)
        .arg("-e")
        .arg(&cli_path)
        .arg(&args.server)
        .arg(pipe_tx.as_raw_fd().to_string())
        .spawn()
        .map_err(|source| EchoTimeError::Spawn {
            program: args.terminal.clone(),
            source,
        })?;

    // The child inherited the write end; drop ours so its exit is the only
    // thing that can close the pipe
    drop(pipe_tx);

    // Reap the terminal process without blocking the menu
    thread::spawn(move || {
        let _ = child.wait();
    });

    relay::run(File::from(pipe_rx), io::stdin(), &mut io::stdout())
}

/// Locate the client binary for `kind` next to this executable.
fn cli_binary(kind: ServiceKind) -> echotime::Result<PathBuf> {
    let name = match kind {
        ServiceKind::Echo => "echo-cli",
        ServiceKind::Time => "time-cli",
    };
    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| {
        EchoTimeError::Usage(format!("cannot locate {} next to {}", name, exe.display()))
    })?;
    Ok(dir.join(name))
}
