//! Root-relative path mapping
//!
//! Message ids are slash-normalized paths relative to the synchronized root,
//! with no leading separator. Resolution is purely lexical: ids never touch
//! the filesystem, and anything that would escape the root is rejected
//! before any I/O happens.

use std::path::{Component, Path, PathBuf};

/// Compute the wire id for an absolute path under `root`.
///
/// Returns `None` for the root itself and for paths outside it.
#[must_use]
pub fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Resolve a wire id against the root.
///
/// Returns `None` when the id is empty, absolute, resolves to the root
/// itself, or escapes the root through `..` components.
#[must_use]
pub fn resolve_within(root: &Path, id: &str) -> Option<PathBuf> {
    if id.is_empty() {
        return None;
    }
    let mut resolved = root.to_path_buf();
    let mut depth: u32 = 0;
    for component in Path::new(id).components() {
        match component {
            Component::Normal(part) => {
                depth += 1;
                resolved.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                resolved.pop();
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if depth == 0 {
        return None;
    }
    Some(resolved)
}
