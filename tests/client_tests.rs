//! Client Integration Tests
//!
//! Exercises the bridges and the relay loop against a real dispatcher:
//! half-close drain ordering, premature-server-close reporting, and the
//! side-channel fan-out to a supervising relay.

use std::fs::File;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use echotime::client::{relay, EchoBridge, SideChannel, TimeBridge};
use echotime::network::Dispatcher;
use echotime::{Config, EchoTimeError};

fn start_server(push_interval: Duration) -> (SocketAddr, SocketAddr) {
    let config = Config::builder()
        .bind_addr([127, 0, 0, 1])
        .echo_port(0)
        .time_port(0)
        .push_interval(push_interval)
        .build();
    let dispatcher = Dispatcher::bind(config).expect("bind ephemeral listeners");
    let addrs = (dispatcher.echo_addr(), dispatcher.time_addr());
    thread::spawn(move || {
        let _ = dispatcher.run();
    });
    addrs
}

// =============================================================================
// Echo Bridge Tests
// =============================================================================

#[test]
fn test_half_close_delivers_echo_before_exit() {
    let (echo_addr, _) = start_server(Duration::from_secs(5));
    let stream = TcpStream::connect(echo_addr).unwrap();

    // Local input: one message immediately followed by end-of-input
    let (input_rx, input_tx) = nix::unistd::pipe().unwrap();
    let mut typed = File::from(input_tx);
    typed.write_all(b"message in flight\n").unwrap();
    drop(typed);

    let mut bridge = EchoBridge::new(stream, File::from(input_rx), None).unwrap();
    let mut shown = Vec::new();
    bridge.run(&mut shown).unwrap();

    // Normal termination, and the echo was displayed first
    assert_eq!(shown, b"< message in flight\n");
}

#[test]
fn test_echo_bridge_relays_multiple_lines_in_order() {
    let (echo_addr, _) = start_server(Duration::from_secs(5));
    let stream = TcpStream::connect(echo_addr).unwrap();

    let (input_rx, input_tx) = nix::unistd::pipe().unwrap();
    let mut typed = File::from(input_tx);
    typed.write_all(b"one\ntwo\nthree\n").unwrap();
    drop(typed);

    let mut bridge = EchoBridge::new(stream, File::from(input_rx), None).unwrap();
    let mut shown = Vec::new();
    bridge.run(&mut shown).unwrap();

    assert_eq!(shown, b"< one\n< two\n< three\n");
}

#[test]
fn test_server_close_during_active_phase_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream); // hang up before the client signaled end-of-input
    });

    let stream = TcpStream::connect(addr).unwrap();
    // Keep the write end open so the bridge stays in its Active phase
    let (input_rx, _input_tx) = nix::unistd::pipe().unwrap();

    let mut bridge = EchoBridge::new(stream, File::from(input_rx), None).unwrap();
    let mut shown = Vec::new();
    let err = bridge.run(&mut shown).unwrap_err();
    assert!(matches!(err, EchoTimeError::ServerDisconnected(_)));
}

// =============================================================================
// Time Bridge Tests
// =============================================================================

#[test]
fn test_time_bridge_displays_pushes_and_reports_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"Tue Sep 29 23:06:19 2015\r\n").unwrap();
        // then the "indefinitely running" service dies
    });

    let stream = TcpStream::connect(addr).unwrap();
    let mut bridge = TimeBridge::new(stream, None);
    let mut shown = Vec::new();
    let err = bridge.run(&mut shown).unwrap_err();

    assert_eq!(shown, b"Tue Sep 29 23:06:19 2015\r\n");
    assert!(matches!(err, EchoTimeError::ServerDisconnected(_)));
}

#[test]
fn test_fatal_diagnostic_reaches_the_supervisor_pipe() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"Tue Sep 29 23:06:19 2015\r\n").unwrap();
        // the "indefinitely running" service dies
    });

    let (side_rx, side_tx) = nix::unistd::pipe().unwrap();
    let stream = TcpStream::connect(addr).unwrap();
    let mut bridge = TimeBridge::new(stream, Some(SideChannel::new(side_tx)));

    let mut shown = Vec::new();
    let err = bridge.run(&mut shown).unwrap_err();

    // What the client binary does before exiting non-zero: its own window
    // is about to vanish, so the error line goes to the supervisor too
    let diagnostic = format!("time-cli: {}\n", err);
    bridge.side_mut().unwrap().send(&diagnostic).unwrap();
    drop(bridge);

    let mut mirrored = Vec::new();
    File::from(side_rx).read_to_end(&mut mirrored).unwrap();
    let text = String::from_utf8(mirrored).unwrap();
    let frames: Vec<&str> = text.split('\0').filter(|f| !f.is_empty()).collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], "Tue Sep 29 23:06:19 2015\r\n");
    assert!(frames[1].starts_with("time-cli: "));
    assert!(frames[1].contains("server terminated prematurely"));
}

// =============================================================================
// Side Channel + Relay Fan-Out
// =============================================================================

#[test]
fn test_relay_mirrors_exactly_what_the_bridge_displays() {
    let (echo_addr, _) = start_server(Duration::from_secs(5));

    let (side_rx, side_tx) = nix::unistd::pipe().unwrap();
    let (input_rx, input_tx) = nix::unistd::pipe().unwrap();
    let (keys_rx, _keys_tx) = nix::unistd::pipe().unwrap();

    let bridge_worker = thread::spawn(move || {
        let stream = TcpStream::connect(echo_addr).unwrap();
        let side = SideChannel::new(side_tx);
        let mut bridge = EchoBridge::new(stream, File::from(input_rx), Some(side)).unwrap();
        let mut shown = Vec::new();
        bridge.run(&mut shown).unwrap();
        shown
    });

    let mut typed = File::from(input_tx);
    typed.write_all(b"mirror me\n").unwrap();
    drop(typed);

    // Supervisor side: relay until the bridge (and with it the pipe's write
    // end) goes away
    let mut relayed = Vec::new();
    relay::run(File::from(side_rx), File::from(keys_rx), &mut relayed).unwrap();

    let shown = bridge_worker.join().unwrap();
    assert_eq!(shown, b"< mirror me\n");
    // The side channel carries the raw line; the relay adds its own prefix
    assert_eq!(relayed, b": mirror me\n");
}
