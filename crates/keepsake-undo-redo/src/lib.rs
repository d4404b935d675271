#![warn(missing_docs)]

//! Undo/Redo engine for keepsake
//!
//! Tracks mutations of a live object graph, groups them into one history
//! entry per tick, and replays whole entries through each object's snapshot
//! contract on undo and redo. Individual objects can have their history
//! flushed into the baseline without disturbing anyone else's.

pub mod change;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod merge;
pub mod models;
pub mod registry;
pub mod tracker;

#[cfg(test)]
mod fixtures;
mod integration_tests;

// Re-export public API
pub use change::{ChangeKind, ChangeRecord, Changeset};
pub use config::{HistoryConfig, MergeConfig, MAX_MERGE_WINDOW_MS};
pub use engine::{TickOutcome, UndoRedoEngine};
pub use error::{Result, UndoRedoError};
pub use history::{HistoryEntry, HistoryStacks};
pub use merge::{MergePolicy, NeverMerge, TimeWindowMerge};
pub use models::{ObjectId, Versioned};
pub use registry::{InMemoryRegistry, ObjectRegistry};
pub use tracker::{ChangeTracker, RecordingPause, TrackedChange};
