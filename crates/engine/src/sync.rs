//! Synchronizer: two producers, one serialized worker
//!
//! The directory watcher and the transport receive loop both feed
//! [`SyncEvent`]s into an mpsc channel; a single worker thread applies them
//! one at a time, taking the lock-strategy guard around every file touch.
//!
//! The send side never compares prior content: every qualifying notification
//! produces a send. Suppression is entirely the receive side's job, which
//! writes only when bytes actually differ. One genuine edit therefore costs
//! exactly one echo, which the originator compares as equal and drops.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use tracing::{debug, error, info, warn};

use pairsync_core::message::Message;
use pairsync_core::retry::RetryPolicy;
use pairsync_transport::MessageHub;

use crate::lock::LockStrategy;
use crate::paths::{relative_id, resolve_within};

/// Anything that can deliver a message to the peer.
pub trait Outbound: Send + Sync {
    /// Deliver one message; failures propagate to the triggering event.
    fn send(&self, message: &Message) -> Result<()>;
}

impl Outbound for MessageHub {
    fn send(&self, message: &Message) -> Result<()> {
        MessageHub::send(self, message)
    }
}

/// One unit of work for the worker.
#[derive(Debug)]
pub enum SyncEvent {
    /// A local file's content changed; absolute path, pre-filtered upstream
    /// to content modification only
    LocalChange(PathBuf),
    /// The peer delivered a message
    Remote(Message),
}

/// Cloneable producer handle feeding the worker. The worker exits once every
/// clone is gone and the queue has drained.
#[derive(Clone)]
pub struct SyncHandle {
    pub(crate) tx: Sender<SyncEvent>,
}

impl SyncHandle {
    /// Queue a local content change. A closed channel just means the
    /// synchronizer is shutting down, so the event is silently dropped.
    pub fn local_change(&self, path: PathBuf) {
        let _ = self.tx.send(SyncEvent::LocalChange(path));
    }

    /// Queue a message received from the peer.
    pub fn remote(&self, message: Message) {
        let _ = self.tx.send(SyncEvent::Remote(message));
    }
}

/// Create the fan-in channel shared by both producers.
#[must_use]
pub fn channel() -> (SyncHandle, Receiver<SyncEvent>) {
    let (tx, rx) = mpsc::channel();
    (SyncHandle { tx }, rx)
}

/// Owns the worker thread.
pub struct Synchronizer {
    worker: Option<JoinHandle<()>>,
}

impl Synchronizer {
    /// Spawn the worker consuming `events`.
    ///
    /// # Errors
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn(
        root: PathBuf,
        outbound: Arc<dyn Outbound>,
        locks: Arc<dyn LockStrategy>,
        retry: RetryPolicy,
        events: Receiver<SyncEvent>,
    ) -> Result<Self> {
        let core = SyncCore::new(root, outbound, locks, retry);
        let worker = std::thread::Builder::new()
            .name("pairsync-worker".to_string())
            .spawn(move || core.run(events))
            .wrap_err("spawning sync worker")?;
        Ok(Self {
            worker: Some(worker),
        })
    }

    /// Block until every producer handle is gone and queued events have
    /// drained. In-flight retry loops run their full budget first.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("sync worker panicked");
            }
        }
    }
}

/// Worker-side state. Applies one event at a time; also usable directly for
/// synchronous, in-process mirroring.
pub struct SyncCore {
    root: PathBuf,
    outbound: Arc<dyn Outbound>,
    locks: Arc<dyn LockStrategy>,
    retry: RetryPolicy,
}

impl SyncCore {
    #[must_use]
    pub fn new(
        root: PathBuf,
        outbound: Arc<dyn Outbound>,
        locks: Arc<dyn LockStrategy>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            root,
            outbound,
            locks,
            retry,
        }
    }

    fn run(&self, events: Receiver<SyncEvent>) {
        for event in events {
            let outcome = match event {
                SyncEvent::LocalChange(path) => self.handle_local_change(&path),
                SyncEvent::Remote(message) => self.handle_remote(message),
            };
            // An exhausted retry or failed send is fatal to its event only;
            // the worker keeps serving.
            if let Err(err) = outcome {
                error!("sync event failed: {err:#}");
            }
        }
        debug!("sync worker drained");
    }

    /// React to a local content change: read the whole file and push it to
    /// the peer. No prior-content comparison is made here.
    ///
    /// # Errors
    /// Returns an error when the read exhausts its retry budget or the send
    /// fails.
    pub fn handle_local_change(&self, path: &Path) -> Result<()> {
        let Some(id) = relative_id(&self.root, path) else {
            debug!(path = %path.display(), "change outside root ignored");
            return Ok(());
        };
        let _guard = self.locks.guard(path);
        let content = self
            .retry
            .run(|| fs::read(path))
            .wrap_err_with(|| format!("reading changed file {} (id {id})", path.display()))?;
        debug!(id = %id, bytes = content.len(), "local change, sending ChangeFile");
        self.outbound
            .send(&Message::change_file(id.clone(), content))
            .wrap_err_with(|| format!("sending ChangeFile for id {id}"))
    }

    /// Apply one message from the peer. Non-`ChangeFile` methods are inert;
    /// violations are reported and dropped without failing the worker.
    ///
    /// # Errors
    /// Returns an error when a read or write exhausts its retry budget.
    pub fn handle_remote(&self, message: Message) -> Result<()> {
        if !message.is_change_file() {
            debug!(method = %message.method, id = %message.id, "ignoring unknown method");
            return Ok(());
        }
        let Some(content) = message.content else {
            warn!(id = %message.id, "dropping ChangeFile without content");
            return Ok(());
        };
        let Some(path) = resolve_within(&self.root, &message.id) else {
            warn!(id = %message.id, "dropping ChangeFile: id escapes the root");
            return Ok(());
        };

        let _guard = self.locks.guard(&path);
        // One read per message; a file that does not exist yet compares as
        // empty current content.
        let current = self
            .retry
            .run(|| match fs::read(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
                other => other,
            })
            .wrap_err_with(|| {
                format!(
                    "reading current content of {} (id {})",
                    path.display(),
                    message.id
                )
            })?;

        if current == content {
            debug!(id = %message.id, "content already matches, nothing to write");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("creating parent directories for {}", path.display()))?;
        }
        self.retry
            .run(|| fs::write(&path, &content))
            .wrap_err_with(|| {
                format!(
                    "writing {} bytes to {} (id {})",
                    content.len(),
                    path.display(),
                    message.id
                )
            })?;
        info!(id = %message.id, bytes = content.len(), "applied remote change");
        Ok(())
    }
}
