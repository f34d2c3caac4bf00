//! Directory watcher adapter
//!
//! Wraps notify's debounced watcher and forwards content modifications of
//! files into the synchronizer channel. Creations, deletions, and renames
//! are deliberately not forwarded; only "this file's content changed"
//! qualifies.

use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use tracing::{debug, warn};

use crate::sync::SyncHandle;

/// Keeps the underlying watcher registered; dropping it unsubscribes.
pub struct DirWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

/// Watch `root` recursively, feeding filtered change notifications into the
/// synchronizer.
///
/// # Errors
/// Returns an error if the watcher cannot be created or registered.
pub fn watch(root: &Path, debounce: Duration, handle: SyncHandle) -> Result<DirWatcher> {
    let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                for event in &events {
                    if !is_content_change(&event.kind) {
                        continue;
                    }
                    for path in &event.paths {
                        if path.is_file() {
                            debug!(path = %path.display(), "content changed");
                            handle.local_change(path.clone());
                        }
                    }
                }
            }
            Err(errors) => {
                for err in errors {
                    warn!("watch error: {err}");
                }
            }
        }
    })
    .wrap_err("creating file watcher")?;

    debouncer
        .watch(root, RecursiveMode::Recursive)
        .wrap_err_with(|| format!("watching {}", root.display()))?;

    Ok(DirWatcher {
        _debouncer: debouncer,
    })
}

/// Only content modification qualifies; renames and metadata-only changes do
/// not.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any))
}
