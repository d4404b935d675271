//! Object identity and the snapshot contract

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Stable, process-unique identity of a versionable object
///
/// History refers to objects only through this id, never through a live
/// reference, so a record stays valid after the live instance is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        ObjectId(Uuid::new_v4())
    }

    /// Wrap an existing uuid (e.g. one loaded from disk)
    pub fn from_uuid(uuid: Uuid) -> Self {
        ObjectId(uuid)
    }

    /// The underlying uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first group of the hyphenated form is enough to tell objects apart in logs
        let full = self.0.hyphenated().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// An object that can hand out and take back mementos of itself
///
/// Snapshots must be immutable captures: nothing a later edit does to the live
/// object may show through a snapshot taken earlier. Cheap clones (for
/// example `Arc`-wrapped data) are encouraged since the engine clones
/// snapshots when it moves records between stacks.
pub trait Versioned: Sized {
    /// Memento type produced by this object
    type Snapshot: Clone;

    /// Stable identity of this object
    fn id(&self) -> ObjectId;

    /// Capture the full observable state
    fn snapshot(&self) -> Self::Snapshot;

    /// Overwrite the current state in place from a snapshot
    ///
    /// Must keep `id()` unchanged. A snapshot of the wrong shape is a contract
    /// violation and should be reported as
    /// [`UndoRedoError::SnapshotMismatch`](crate::UndoRedoError::SnapshotMismatch).
    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<()>;

    /// Build a fresh stand-in for `id` from a snapshot
    ///
    /// Used when undo or redo has to bring back an object that is no longer
    /// registered.
    fn materialize(id: ObjectId, snapshot: &Self::Snapshot) -> Result<Self>;
}
