//! TCP endpoint helpers
//!
//! The engine consumes an already-connected stream; these helpers are the
//! collaborator that decides which side listens and which dials. Exactly one
//! peer is ever accepted: the protocol is strictly point-to-point.

use std::net::{TcpListener, TcpStream};

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use tracing::info;

/// Bind the given port on all interfaces and accept exactly one peer.
///
/// # Errors
/// Returns an error if binding or accepting fails.
pub fn listen(port: u16) -> Result<TcpStream> {
    let listener =
        TcpListener::bind(("0.0.0.0", port)).wrap_err_with(|| format!("binding port {port}"))?;
    info!("Listening on port {port}...");
    let (stream, peer) = listener.accept().wrap_err("accepting peer")?;
    info!("Peer connected from {peer}");
    Ok(stream)
}

/// Resolve and connect to a `host:port` peer.
///
/// # Errors
/// Returns an error if resolution or the connection fails.
pub fn dial(addr: &str) -> Result<TcpStream> {
    info!("Connecting to {addr}...");
    let stream = TcpStream::connect(addr).wrap_err_with(|| format!("connecting to {addr}"))?;
    info!("Connected to {addr}");
    Ok(stream)
}
