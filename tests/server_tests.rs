//! Server Integration Tests
//!
//! Drives a real dispatcher over loopback sockets: echo fidelity across
//! arbitrary chunkings, isolation between concurrent sessions, fairness
//! between the two listeners, and the time service's push cadence.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use echotime::network::Dispatcher;
use echotime::Config;

/// Start a dispatcher on ephemeral ports; the thread is detached and
/// reclaimed at process teardown, like the real server's process-lifetime
/// listeners.
fn start_server(push_interval: Duration) -> (SocketAddr, SocketAddr) {
    let config = Config::builder()
        .bind_addr([127, 0, 0, 1])
        .echo_port(0)
        .time_port(0)
        .push_interval(push_interval)
        .build();

    let dispatcher = Dispatcher::bind(config).expect("bind ephemeral listeners");
    let echo_addr = dispatcher.echo_addr();
    let time_addr = dispatcher.time_addr();
    thread::spawn(move || {
        let _ = dispatcher.run();
    });
    (echo_addr, time_addr)
}

// =============================================================================
// Echo Service Tests
// =============================================================================

#[test]
fn test_echo_fidelity_across_chunkings() {
    let (echo_addr, _) = start_server(Duration::from_secs(5));

    let payload: Vec<u8> = (0..=255u8).cycle().take(4000).collect();
    let mut stream = TcpStream::connect(echo_addr).unwrap();

    // Deliberately awkward chunk sizes; the echo relation is many-to-many
    for chunk in payload.chunks(97) {
        stream.write_all(chunk).unwrap();
    }
    stream.shutdown(std::net::Shutdown::Write).unwrap();

    let mut echoed = Vec::new();
    stream.read_to_end(&mut echoed).unwrap();
    assert_eq!(echoed, payload);
}

#[test]
fn test_concurrent_echo_sessions_are_isolated() {
    let (echo_addr, _) = start_server(Duration::from_secs(5));

    let workers: Vec<_> = (0..2u8)
        .map(|id| {
            thread::spawn(move || {
                let marker = [b'A' + id; 512];
                let mut stream = TcpStream::connect(echo_addr).unwrap();
                for _ in 0..8 {
                    stream.write_all(&marker).unwrap();
                    thread::sleep(Duration::from_millis(5));
                }
                stream.shutdown(std::net::Shutdown::Write).unwrap();

                let mut echoed = Vec::new();
                stream.read_to_end(&mut echoed).unwrap();
                // Only this connection's bytes, never the sibling's
                assert_eq!(echoed.len(), 512 * 8);
                assert!(echoed.iter().all(|&b| b == b'A' + id));
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_dispatcher_serves_both_listeners_without_starvation() {
    let (echo_addr, time_addr) = start_server(Duration::from_millis(100));

    // Offer connections on both endpoints at the same time
    let echo_client = thread::spawn(move || {
        let mut stream = TcpStream::connect(echo_addr).unwrap();
        stream.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    });
    let time_client = thread::spawn(move || {
        let stream = TcpStream::connect(time_addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        assert!(line.ends_with("\r\n"));
    });

    echo_client.join().unwrap();
    time_client.join().unwrap();
}

// =============================================================================
// Time Service Tests
// =============================================================================

#[test]
fn test_time_cadence_on_idle_connection() {
    let interval = Duration::from_millis(300);
    let (_, time_addr) = start_server(interval);

    let mut stream = TcpStream::connect(time_addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();

    // Observe for 2.5 intervals with no input, accumulating raw bytes so a
    // push split across a read-timeout boundary is never dropped
    let deadline = Instant::now() + interval * 5 / 2;
    let mut received = Vec::new();
    let mut buf = [0u8; 256];
    while Instant::now() < deadline {
        match stream.read(&mut buf) {
            Ok(0) => panic!("time service closed an idle connection"),
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => panic!("read error: {}", e),
        }
    }

    let text = String::from_utf8(received).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2, "got {:?}", lines);
    assert!(text.ends_with("\r\n"), "trailing push was cut short");
    for line in &lines {
        assert_eq!(line.len(), 24);
    }
}

#[test]
fn test_time_service_survives_client_chatter() {
    let interval = Duration::from_millis(200);
    let (_, time_addr) = start_server(interval);

    let mut stream = TcpStream::connect(time_addr).unwrap();
    // Payload is discarded by the server; the session must keep running
    stream.write_all(b"noise the protocol never defined\n").unwrap();

    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).unwrap();
    assert!(line.ends_with("\r\n"));
}
