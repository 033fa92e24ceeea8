//! Shared handle with atomic whole-snapshot swap

use crate::snapshot::ReferenceSnapshot;
use crate::Result;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Cloneable handle to the current reference snapshot
///
/// Readers take an `Arc` to the snapshot and keep it for as long as they
/// need; a reload replaces the pointer, never the contents, so a reader
/// holding the old snapshot is unaffected.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    current: Arc<RwLock<Arc<ReferenceSnapshot>>>,
}

impl SnapshotHandle {
    /// Wrap an initial snapshot
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<ReferenceSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the snapshot, returning the previous one
    pub fn swap(&self, snapshot: ReferenceSnapshot) -> Arc<ReferenceSnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Parse and validate a file, then swap it in
    ///
    /// On error the current snapshot stays in place.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let snapshot = ReferenceSnapshot::from_file(path)?;
        self.swap(snapshot);

        info!(path = %path.display(), "Reference snapshot swapped");
        Ok(())
    }
}

impl From<ReferenceSnapshot> for SnapshotHandle {
    fn from(snapshot: ReferenceSnapshot) -> Self {
        Self::new(snapshot)
    }
}
