//! Change records and per-tick changesets

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UndoRedoError};
use crate::models::ObjectId;
use crate::tracker::TrackedChange;

/// What a record does to its object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Object came into existence
    Create,
    /// Object state changed
    Modify,
    /// Object was removed
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "Create"),
            ChangeKind::Modify => write!(f, "Modify"),
            ChangeKind::Delete => write!(f, "Delete"),
        }
    }
}

/// One object's before/after pair inside a changeset
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord<S> {
    /// Version of the changeset the record was first written into
    pub version: u64,
    /// Object the record applies to
    pub id: ObjectId,
    /// State to restore on undo; `None` means undo removes the object
    pub prev: Option<S>,
    /// State to restore on redo; `None` means redo removes the object
    pub next: Option<S>,
}

impl<S> ChangeRecord<S> {
    /// Build a record from a drained tracker entry
    pub fn from_tracked(version: u64, change: TrackedChange<S>) -> Self {
        ChangeRecord {
            version,
            id: change.id,
            prev: change.prev,
            next: change.next,
        }
    }

    /// Classify the record
    pub fn kind(&self) -> ChangeKind {
        match (&self.prev, &self.next) {
            (None, _) => ChangeKind::Create,
            (Some(_), None) => ChangeKind::Delete,
            (Some(_), Some(_)) => ChangeKind::Modify,
        }
    }

    /// Check that the record carries at least one snapshot
    pub fn validate(&self) -> Result<()> {
        if self.prev.is_none() && self.next.is_none() {
            return Err(UndoRedoError::validation_error(format!(
                "record for {} has neither a previous nor a next snapshot",
                self.id
            )));
        }
        Ok(())
    }
}

/// The set of records observed in one tick, unique by object id
///
/// Records keep the order in which their objects were first touched.
#[derive(Debug, Clone)]
pub struct Changeset<S> {
    version: u64,
    recorded_at: DateTime<Utc>,
    records: Vec<ChangeRecord<S>>,
    index: HashMap<ObjectId, usize>,
}

impl<S> Changeset<S> {
    /// Create an empty changeset stamped with the current time
    pub fn new(version: u64) -> Self {
        Self::at(version, Utc::now())
    }

    /// Create an empty changeset stamped with `recorded_at`
    pub fn at(version: u64, recorded_at: DateTime<Utc>) -> Self {
        Changeset {
            version,
            recorded_at,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a changeset out of one tick's drained changes
    pub fn from_tracked(
        version: u64,
        recorded_at: DateTime<Utc>,
        changes: Vec<TrackedChange<S>>,
    ) -> Self {
        let mut changeset = Self::at(version, recorded_at);
        for change in changes {
            changeset.insert(ChangeRecord::from_tracked(version, change));
        }
        changeset
    }

    /// Version this changeset was recorded at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When this changeset was recorded (or last merged into)
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Add a record, merging with any record already held for the same id
    ///
    /// The merged record takes the incoming next state but keeps the oldest
    /// previous state, so one undo still returns to where the changeset
    /// started. A merge that ends with neither state (created, then deleted)
    /// leaves no record behind.
    pub fn insert(&mut self, mut record: ChangeRecord<S>) {
        match self.index.get(&record.id).copied() {
            Some(pos) => {
                let existing = &mut self.records[pos];
                existing.next = record.next.take();
                if existing.prev.is_none() && existing.next.is_none() {
                    let id = existing.id;
                    self.remove(&id);
                }
            }
            None => {
                if record.prev.is_none() && record.next.is_none() {
                    return;
                }
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Add a record, overwriting any record already held for the same id
    pub fn replace(&mut self, record: ChangeRecord<S>) {
        match self.index.get(&record.id).copied() {
            Some(pos) => self.records[pos] = record,
            None => {
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Remove the record for an id
    pub fn remove(&mut self, id: &ObjectId) -> Option<ChangeRecord<S>> {
        let pos = self.index.remove(id)?;
        let record = self.records.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(record)
    }

    /// Fold a later changeset into this one
    ///
    /// Records merge with [`insert`](Self::insert) semantics, take this
    /// changeset's version, and the timestamp advances to the later
    /// changeset's.
    pub fn absorb(&mut self, later: Changeset<S>) {
        self.recorded_at = self.recorded_at.max(later.recorded_at);
        for mut record in later.records {
            record.version = self.version;
            self.insert(record);
        }
    }

    /// Record for an id
    pub fn get(&self, id: &ObjectId) -> Option<&ChangeRecord<S>> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Whether an id is touched by this changeset
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains_key(id)
    }

    /// Touched ids in first-touch order
    pub fn ids(&self) -> Vec<ObjectId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Records in first-touch order
    pub fn records(&self) -> &[ChangeRecord<S>] {
        &self.records
    }

    /// Whether any record creates or deletes an object
    pub fn has_structural_changes(&self) -> bool {
        self.records.iter().any(|r| r.kind() != ChangeKind::Modify)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the changeset holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<S> fmt::Display for Changeset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] v{} ({} objects)",
            self.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            self.version,
            self.records.len()
        )
    }
}
