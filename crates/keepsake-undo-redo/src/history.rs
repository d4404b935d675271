//! Past/future changeset stacks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::change::Changeset;
use crate::models::ObjectId;

/// Summary of one history entry, for history views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Version the entry was recorded at
    pub version: u64,
    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,
    /// Objects touched by the entry
    pub objects: Vec<ObjectId>,
    /// Whether the entry currently sits on the redo side
    pub is_undone: bool,
}

impl HistoryEntry {
    fn from_changeset<S>(changeset: &Changeset<S>, is_undone: bool) -> Self {
        HistoryEntry {
            version: changeset.version(),
            recorded_at: changeset.recorded_at(),
            objects: changeset.ids(),
            is_undone,
        }
    }
}

/// Undoable and redoable changesets plus the version counter
///
/// `past[0]` is the baseline: the load-time state. It is never popped, so
/// there is something to undo only while more than one past entry exists.
#[derive(Debug, Clone)]
pub struct HistoryStacks<S> {
    past: Vec<Changeset<S>>,
    future: Vec<Changeset<S>>,
    version: u64,
}

impl<S> HistoryStacks<S> {
    /// Create stacks holding only an empty baseline
    pub fn new() -> Self {
        HistoryStacks {
            past: vec![Changeset::new(0)],
            future: Vec::new(),
            version: 0,
        }
    }

    /// Current version; advances once per recorded entry
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Allocate the next version number
    pub(crate) fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Get the number of undoable entries
    pub fn undoable_count(&self) -> usize {
        self.past.len() - 1
    }

    /// Get the number of redoable entries
    pub fn redoable_count(&self) -> usize {
        self.future.len()
    }

    /// The load-time baseline
    pub fn baseline(&self) -> &Changeset<S> {
        &self.past[0]
    }

    pub(crate) fn baseline_mut(&mut self) -> &mut Changeset<S> {
        &mut self.past[0]
    }

    /// Most recent undoable entry, if any
    pub fn latest(&self) -> Option<&Changeset<S>> {
        if self.can_undo() {
            self.past.last()
        } else {
            None
        }
    }

    pub(crate) fn latest_mut(&mut self) -> Option<&mut Changeset<S>> {
        if self.can_undo() {
            self.past.last_mut()
        } else {
            None
        }
    }

    /// Push a new entry and drop everything that could be redone
    pub fn push(&mut self, changeset: Changeset<S>) {
        self.past.push(changeset);
        self.future.clear();
    }

    pub(crate) fn pop_past(&mut self) -> Option<Changeset<S>> {
        if self.can_undo() {
            self.past.pop()
        } else {
            None
        }
    }

    pub(crate) fn push_past(&mut self, changeset: Changeset<S>) {
        self.past.push(changeset);
    }

    pub(crate) fn pop_future(&mut self) -> Option<Changeset<S>> {
        self.future.pop()
    }

    pub(crate) fn push_future(&mut self, changeset: Changeset<S>) {
        self.future.push(changeset);
    }

    /// Drop the oldest undoable entries until at most `max_depth` remain
    ///
    /// Returns how many entries were dropped. The baseline is kept.
    pub fn trim_to(&mut self, max_depth: usize) -> usize {
        let excess = self.undoable_count().saturating_sub(max_depth);
        if excess > 0 {
            self.past.drain(1..=excess);
        }
        excess
    }

    /// Remove every record for `id` outside the baseline
    ///
    /// Entries left empty are dropped. Returns the number of records removed.
    pub(crate) fn strip(&mut self, id: &ObjectId) -> usize {
        let mut removed = 0;
        for changeset in self.past.iter_mut().skip(1).chain(self.future.iter_mut()) {
            if changeset.remove(id).is_some() {
                removed += 1;
            }
        }
        let baseline = self.past.remove(0);
        self.past.retain(|c| !c.is_empty());
        self.past.insert(0, baseline);
        self.future.retain(|c| !c.is_empty());
        removed
    }

    /// Paginated history, oldest first, baseline excluded
    ///
    /// Undoable entries come first, followed by redoable ones in the order
    /// redo would apply them.
    pub fn entries(&self, limit: usize, offset: usize) -> Vec<HistoryEntry> {
        self.all_entries().skip(offset).take(limit).collect()
    }

    /// Entries that touch a specific object
    pub fn changes_for(&self, id: &ObjectId) -> Vec<HistoryEntry> {
        self.all_entries()
            .filter(|entry| entry.objects.contains(id))
            .collect()
    }

    fn all_entries(&self) -> impl Iterator<Item = HistoryEntry> + '_ {
        let done = self
            .past
            .iter()
            .skip(1)
            .map(|c| HistoryEntry::from_changeset(c, false));
        let undone = self
            .future
            .iter()
            .rev()
            .map(|c| HistoryEntry::from_changeset(c, true));
        done.chain(undone)
    }
}

impl<S> Default for HistoryStacks<S> {
    fn default() -> Self {
        Self::new()
    }
}
