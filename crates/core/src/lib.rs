//! pairsync-core: Core mirroring primitives
//!
//! Provides the wire message, the self-delimiting frame codec, the bounded
//! retry executor, and project configuration shared by the transport and
//! engine crates.

pub mod config;
pub mod frame;
pub mod message;
pub mod retry;

pub use config::Config;
pub use frame::{read_frame, write_frame};
pub use message::{Message, CHANGE_FILE};
pub use retry::RetryPolicy;
