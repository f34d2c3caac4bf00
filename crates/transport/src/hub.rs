//! Message hub: one duplex stream, one subscriber
//!
//! `send` serializes concurrent callers on a writer lock so frames never
//! interleave. A dedicated thread blocks reading one frame at a time and
//! hands each decoded message to the subscriber, strictly one dispatch in
//! flight, in arrival order. A frame that fails to decode is fatal to the
//! loop; a clean close at a frame boundary stops it gracefully.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use tracing::{debug, error, trace};

use pairsync_core::frame::{read_frame, write_frame};
use pairsync_core::message::Message;

/// Callback receiving decoded messages, one at a time, in arrival order.
pub type Subscriber = Box<dyn FnMut(Message) + Send>;

/// Reliable, ordered delivery of [`Message`] values over one
/// already-connected duplex stream.
pub struct MessageHub {
    writer: Mutex<Box<dyn Write + Send>>,
    close_stream: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    closed: Arc<ClosedFlag>,
}

impl MessageHub {
    /// Start a hub over an already-connected TCP stream.
    ///
    /// # Errors
    /// Returns an error if the stream cannot be cloned into its two halves or
    /// the receive thread cannot be spawned.
    pub fn over_tcp(stream: TcpStream, subscriber: Subscriber) -> Result<Self> {
        let reader = stream
            .try_clone()
            .wrap_err("cloning stream for receive loop")?;
        let closer = stream.try_clone().wrap_err("cloning stream for shutdown")?;
        Self::spawn(
            reader,
            stream,
            move || {
                let _ = closer.shutdown(Shutdown::Both);
            },
            subscriber,
        )
    }

    /// Start a hub over any duplex byte stream, supplied as its two halves
    /// plus a closer that unblocks a reader stuck in a blocking read.
    ///
    /// # Errors
    /// Returns an error if the receive thread cannot be spawned.
    pub fn spawn(
        reader: impl Read + Send + 'static,
        writer: impl Write + Send + 'static,
        close: impl FnOnce() + Send + 'static,
        subscriber: Subscriber,
    ) -> Result<Self> {
        let closed = Arc::new(ClosedFlag::default());
        let loop_closed = Arc::clone(&closed);
        let handle = std::thread::Builder::new()
            .name("pairsync-recv".to_string())
            .spawn(move || {
                receive_loop(reader, subscriber);
                loop_closed.set();
            })
            .wrap_err("spawning receive loop")?;

        Ok(Self {
            writer: Mutex::new(Box::new(writer)),
            close_stream: Mutex::new(Some(Box::new(close))),
            receiver: Mutex::new(Some(handle)),
            closed,
        })
    }

    /// Encode and write one frame. Concurrent senders serialize here, so
    /// frames never interleave. Failures propagate to the caller; the hub
    /// never retries a send.
    ///
    /// # Errors
    /// Returns an error if encoding or the underlying write fails.
    pub fn send(&self, message: &Message) -> Result<()> {
        let payload = message.encode()?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        write_frame(&mut *writer, &payload)
            .and_then(|()| writer.flush())
            .wrap_err_with(|| format!("sending frame for id {:?}", message.id))?;
        trace!(id = %message.id, bytes = payload.len(), "frame sent");
        Ok(())
    }

    /// Block until the receive loop has exited, either because the peer
    /// closed the stream or because a frame failed to decode.
    pub fn wait_closed(&self) {
        self.closed.wait();
    }

    /// Close the stream and join the receive loop. No dispatch occurs after
    /// this returns. Safe to call more than once.
    pub fn shutdown(&self) {
        let close = self
            .close_stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(close) = close {
            close();
        }
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("receive loop panicked");
            }
        }
    }
}

impl Drop for MessageHub {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(mut reader: impl Read, mut subscriber: Subscriber) {
    loop {
        let payload = match read_frame(&mut reader) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("peer closed the stream");
                break;
            }
            Err(err) => {
                error!("receive loop stopping: unreadable frame: {err}");
                break;
            }
        };
        let message = match Message::decode(&payload) {
            Ok(message) => message,
            Err(err) => {
                error!("receive loop stopping: undecodable payload: {err}");
                break;
            }
        };
        trace!(id = %message.id, method = %message.method, "frame received");
        subscriber(message);
    }
}

/// Latched "receive loop is done" flag.
#[derive(Default)]
struct ClosedFlag {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl ClosedFlag {
    fn set(&self) {
        let mut done = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut done = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .cond
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
