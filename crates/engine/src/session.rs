//! Session assembly and ordered teardown
//!
//! A session wires the three moving parts together: the transport hub feeds
//! remote messages into the synchronizer channel, the watcher feeds local
//! changes into the same channel, and one worker drains it.

use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use tracing::info;

use pairsync_core::config::Config;
use pairsync_transport::MessageHub;

use crate::lock::TreeLock;
use crate::sync::{self, Outbound, Synchronizer};
use crate::watch::{self, DirWatcher};

/// One live mirroring session: watcher + transport + worker.
pub struct SyncSession {
    hub: Arc<MessageHub>,
    watcher: DirWatcher,
    synchronizer: Synchronizer,
}

impl SyncSession {
    /// Wire a session over an already-connected TCP stream.
    ///
    /// # Errors
    /// Returns an error if the root cannot be resolved or any of the parts
    /// fails to start.
    pub fn start(root: &Path, stream: TcpStream, config: &Config) -> Result<Self> {
        let root = root
            .canonicalize()
            .wrap_err_with(|| format!("resolving root {}", root.display()))?;

        // The hub needs a producer handle and the worker needs the hub, so
        // the channel is created first and everyone gets a clone.
        let (handle, events) = sync::channel();

        let remote = handle.clone();
        let hub = Arc::new(MessageHub::over_tcp(
            stream,
            Box::new(move |message| remote.remote(message)),
        )?);

        let outbound: Arc<dyn Outbound> = hub.clone();
        let synchronizer = Synchronizer::spawn(
            root.clone(),
            outbound,
            Arc::new(TreeLock::default()),
            config.retry_policy(),
            events,
        )?;

        let watcher = watch::watch(&root, config.debounce(), handle)?;

        info!(root = %root.display(), "mirroring session started");
        Ok(Self {
            hub,
            watcher,
            synchronizer,
        })
    }

    /// Block until the peer disconnects or the receive loop dies.
    pub fn wait(&self) {
        self.hub.wait_closed();
    }

    /// Tear down in order: unsubscribe the watcher, shut the transport down,
    /// then drain the worker. Blocks until queued events are applied; the
    /// sync lock is never held while waiting.
    pub fn shutdown(self) {
        drop(self.watcher);
        self.hub.shutdown();
        self.synchronizer.join();
        info!("mirroring session closed");
    }
}
