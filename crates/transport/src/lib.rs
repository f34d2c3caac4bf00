//! pairsync-transport: message delivery over one duplex stream
//!
//! Owns the connected stream, frames outgoing messages, and runs the receive
//! loop that hands incoming messages to a subscriber. Also provides the TCP
//! helpers that decide listener vs dialer; the engine itself never touches
//! sockets.

pub mod hub;
pub mod net;

pub use hub::{MessageHub, Subscriber};
