//! Temporary workspace shared with the external engine
//!
//! Each run gets a fresh uniquely-named directory used to exchange
//! per-timepoint files with the engine. The directory is removed when the
//! [`Workspace`] is dropped; a process-wide registry additionally lets a
//! host remove any still-live workspaces from its own shutdown path, so
//! abnormal termination does not leave temp state behind.

use crate::error::DetectorError;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static REGISTRY: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// A scoped temporary directory for one pipeline run.
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace directory and register it for cleanup.
    pub fn acquire() -> Result<Self, DetectorError> {
        let dir = tempfile::Builder::new()
            .prefix("cellseg-")
            .tempdir()
            .map_err(|e| DetectorError::WorkspaceCreation(e.to_string()))?;
        // Deletion is handled by this module, not by TempDir.
        let path = dir.into_path();
        REGISTRY.lock().push(path.clone());
        debug!("Acquired workspace {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        remove_tree(&self.path);
        REGISTRY.lock().retain(|p| p != &self.path);
    }
}

/// Best-effort removal of every workspace still registered.
///
/// Intended to be called from a host's shutdown handler; safe to call at
/// any time, including after workspaces were already dropped.
pub fn cleanup_registered() {
    let paths: Vec<PathBuf> = REGISTRY.lock().drain(..).collect();
    for path in paths {
        remove_tree(&path);
    }
}

/// Recursively delete `path`, files before directories. Entries that are
/// already gone are not an error.
fn remove_tree(path: &Path) {
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let child = entry.path();
            if child.is_dir() {
                remove_tree(&child);
            } else if let Err(e) = fs::remove_file(&child) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", child.display(), e);
                }
            }
        }
    }
    if let Err(e) = fs::remove_dir(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_unique_dirs() {
        let a = Workspace::acquire().unwrap();
        let b = Workspace::acquire().unwrap();
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_nested_content() {
        let ws = Workspace::acquire().unwrap();
        let root = ws.path().to_path_buf();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("mask.png"), b"data").unwrap();
        fs::write(root.join("0.tif"), b"data").unwrap();
        drop(ws);
        assert!(!root.exists());
    }

    #[test]
    fn test_remove_tree_tolerates_missing_path() {
        remove_tree(Path::new("/tmp/cellseg-does-not-exist-anywhere"));
    }
}
