//! pairsync-engine: the synchronization engine
//!
//! Translates local change notifications into outgoing `ChangeFile` messages
//! and incoming messages into local writes. Two producers (the directory
//! watcher and the transport receive loop) feed one serialized worker, so
//! file touches never interleave.

pub mod lock;
pub mod paths;
pub mod session;
pub mod sync;
pub mod watch;

pub use lock::{LockStrategy, TreeLock};
pub use session::SyncSession;
pub use sync::{Outbound, SyncCore, SyncEvent, SyncHandle, Synchronizer};
pub use watch::DirWatcher;
