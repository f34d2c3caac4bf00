//! End-to-end mirroring over a loopback TCP pair
//!
//! Exercises the full chain: watcher -> synchronizer -> transport -> peer
//! synchronizer -> disk, including the echo that must settle after exactly
//! one round trip.

use std::fs;
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::time::{Duration, Instant};

use pairsync_core::config::Config;
use pairsync_engine::SyncSession;

fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let dialer = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
    let (accepted, _) = listener.accept().unwrap();
    (accepted, dialer.join().unwrap())
}

fn test_config() -> Config {
    Config {
        debounce_ms: 50,
        retry_delay_ms: 10,
        ..Config::default()
    }
}

fn wait_for(what: &str, deadline: Duration, mut check: impl FnMut() -> bool) {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if check() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("timed out waiting for {what}");
}

fn content(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

#[test]
fn test_edit_propagates_and_echo_settles() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    // Same file on both sides before the session starts
    fs::write(dir_a.path().join("a.txt"), "foo").unwrap();
    fs::write(dir_b.path().join("a.txt"), "foo").unwrap();

    let (stream_a, stream_b) = tcp_pair();
    let config = test_config();
    let session_a = SyncSession::start(dir_a.path(), stream_a, &config).unwrap();
    let session_b = SyncSession::start(dir_b.path(), stream_b, &config).unwrap();

    // Let both watchers register before editing
    std::thread::sleep(Duration::from_millis(300));
    fs::write(dir_a.path().join("a.txt"), "bar").unwrap();

    wait_for("peer to apply the edit", Duration::from_secs(15), || {
        content(&dir_b.path().join("a.txt")) == Some(b"bar".to_vec())
    });

    // The peer's own watch fires and echoes the write back; the originator
    // compares equal and the loop settles with both sides at "bar".
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(content(&dir_a.path().join("a.txt")), Some(b"bar".to_vec()));
    assert_eq!(content(&dir_b.path().join("a.txt")), Some(b"bar".to_vec()));

    session_a.shutdown();
    session_b.wait();
    session_b.shutdown();
}

#[test]
fn test_edits_flow_both_directions() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    fs::write(dir_a.path().join("left.txt"), "old-left").unwrap();
    fs::write(dir_b.path().join("left.txt"), "old-left").unwrap();
    fs::write(dir_a.path().join("right.txt"), "old-right").unwrap();
    fs::write(dir_b.path().join("right.txt"), "old-right").unwrap();

    let (stream_a, stream_b) = tcp_pair();
    let config = test_config();
    let session_a = SyncSession::start(dir_a.path(), stream_a, &config).unwrap();
    let session_b = SyncSession::start(dir_b.path(), stream_b, &config).unwrap();

    std::thread::sleep(Duration::from_millis(300));
    fs::write(dir_a.path().join("left.txt"), "new-left").unwrap();
    fs::write(dir_b.path().join("right.txt"), "new-right").unwrap();

    wait_for("a's edit to reach b", Duration::from_secs(15), || {
        content(&dir_b.path().join("left.txt")) == Some(b"new-left".to_vec())
    });
    wait_for("b's edit to reach a", Duration::from_secs(15), || {
        content(&dir_a.path().join("right.txt")) == Some(b"new-right".to_vec())
    });

    session_a.shutdown();
    session_b.shutdown();
}

#[test]
fn test_session_wait_returns_when_peer_leaves() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let (stream_a, stream_b) = tcp_pair();
    let config = test_config();
    let session_a = SyncSession::start(dir_a.path(), stream_a, &config).unwrap();
    let session_b = SyncSession::start(dir_b.path(), stream_b, &config).unwrap();

    session_a.shutdown();
    // Unblocks because the peer closed the stream
    session_b.wait();
    session_b.shutdown();
}
