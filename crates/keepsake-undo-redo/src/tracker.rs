//! Change feed: collects mutations between ticks

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::models::{ObjectId, Versioned};

/// One object's net change since the previous drain
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedChange<S> {
    /// Object that changed
    pub id: ObjectId,
    /// State before the first mutation of the tick; `None` if created this tick
    pub prev: Option<S>,
    /// State after the last mutation of the tick; `None` if deleted this tick
    pub next: Option<S>,
}

impl<S> TrackedChange<S> {
    /// Whether the object was removed during the tick
    pub fn deleted(&self) -> bool {
        self.next.is_none()
    }
}

struct PendingChange<S> {
    prev: Option<S>,
    next: Option<S>,
}

struct TrackerState<S> {
    // last state the history knows about, per object
    committed: HashMap<ObjectId, S>,
    pending: HashMap<ObjectId, PendingChange<S>>,
    // first-touch order of pending ids
    order: Vec<ObjectId>,
    pause_depth: usize,
}

impl<S> TrackerState<S> {
    fn new() -> Self {
        TrackerState {
            committed: HashMap::new(),
            pending: HashMap::new(),
            order: Vec::new(),
            pause_depth: 0,
        }
    }
}

/// Observer that model code notifies whenever a versionable object changes
///
/// The tracker is a cheap, cloneable handle: the model keeps one to report
/// mutations and the engine keeps another to drain them once per tick. It is
/// single-threaded; every clone must live on the thread that runs the engine.
pub struct ChangeTracker<S> {
    state: Rc<RefCell<TrackerState<S>>>,
}

impl<S: Clone> ChangeTracker<S> {
    /// Create a new change tracker
    pub fn new() -> Self {
        ChangeTracker {
            state: Rc::new(RefCell::new(TrackerState::new())),
        }
    }

    /// Remember an object's load-time state without recording a change
    pub fn track<V>(&self, object: &V)
    where
        V: Versioned<Snapshot = S>,
    {
        let snapshot = object.snapshot();
        self.state.borrow_mut().committed.insert(object.id(), snapshot);
    }

    /// Report that an object's observable state just changed
    ///
    /// The first report for an id within a tick pins the previous state to
    /// what was committed at the last drain; later reports only replace the
    /// next state. An id with no committed state is treated as a creation.
    pub fn on_mutation<V>(&self, object: &V)
    where
        V: Versioned<Snapshot = S>,
    {
        let id = object.id();
        if !self.is_recording() {
            trace!(id = %id, "mutation ignored while recording is paused");
            return;
        }
        let snapshot = object.snapshot();

        let mut state = self.state.borrow_mut();
        if let Some(pending) = state.pending.get_mut(&id) {
            pending.next = Some(snapshot);
            return;
        }
        let prev = state.committed.get(&id).cloned();
        state.pending.insert(
            id,
            PendingChange {
                prev,
                next: Some(snapshot),
            },
        );
        state.order.push(id);
    }

    /// Report that an object was removed from the live registry
    pub fn on_deleted(&self, id: ObjectId) {
        if !self.is_recording() {
            trace!(id = %id, "deletion ignored while recording is paused");
            return;
        }

        let mut state = self.state.borrow_mut();
        if let Some(pending) = state.pending.get_mut(&id) {
            pending.next = None;
            return;
        }
        match state.committed.get(&id).cloned() {
            Some(prev) => {
                state.pending.insert(
                    id,
                    PendingChange {
                        prev: Some(prev),
                        next: None,
                    },
                );
                state.order.push(id);
            }
            None => warn!(id = %id, "deletion of untracked object ignored"),
        }
    }

    /// Take every pending change, in first-touch order
    ///
    /// Committed states advance to each change's next state. Objects created
    /// and deleted within the same tick produce nothing.
    pub fn drain(&self) -> Vec<TrackedChange<S>> {
        let mut state = self.state.borrow_mut();
        let order = std::mem::take(&mut state.order);
        let mut pending = std::mem::take(&mut state.pending);

        let mut changes = Vec::with_capacity(order.len());
        for id in order {
            let Some(change) = pending.remove(&id) else {
                continue;
            };
            match &change.next {
                Some(next) => {
                    state.committed.insert(id, next.clone());
                }
                None => {
                    state.committed.remove(&id);
                }
            }
            if change.prev.is_none() && change.next.is_none() {
                trace!(id = %id, "created and deleted within one tick");
                continue;
            }
            changes.push(TrackedChange {
                id,
                prev: change.prev,
                next: change.next,
            });
        }
        changes
    }

    /// Drop every pending change without touching committed state
    pub fn discard_pending(&self) -> usize {
        let mut state = self.state.borrow_mut();
        state.order.clear();
        let dropped = state.pending.len();
        state.pending.clear();
        dropped
    }

    /// Drop the pending change for one object, if any
    pub fn discard(&self, id: &ObjectId) {
        let mut state = self.state.borrow_mut();
        if state.pending.remove(id).is_some() {
            state.order.retain(|pending| pending != id);
        }
    }

    /// Overwrite the committed state of an object (`None` marks it absent)
    pub fn resync(&self, id: ObjectId, snapshot: Option<S>) {
        let mut state = self.state.borrow_mut();
        match snapshot {
            Some(snapshot) => {
                state.committed.insert(id, snapshot);
            }
            None => {
                state.committed.remove(&id);
            }
        }
    }

    /// Committed state the next mutation of `id` would be diffed against
    pub fn committed(&self, id: &ObjectId) -> Option<S> {
        self.state.borrow().committed.get(id).cloned()
    }

    /// Number of objects with pending changes
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Whether mutations are currently being recorded
    pub fn is_recording(&self) -> bool {
        self.state.borrow().pause_depth == 0
    }

    /// Stop recording until the returned guard is dropped
    ///
    /// Pauses nest; recording resumes when the last guard goes away.
    pub fn pause(&self) -> RecordingPause<S> {
        self.state.borrow_mut().pause_depth += 1;
        RecordingPause {
            state: Rc::clone(&self.state),
        }
    }
}

impl<S: Clone> Default for ChangeTracker<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for ChangeTracker<S> {
    fn clone(&self) -> Self {
        ChangeTracker {
            state: Rc::clone(&self.state),
        }
    }
}

impl<S> fmt::Debug for ChangeTracker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChangeTracker")
            .field("committed", &state.committed.len())
            .field("pending", &state.pending.len())
            .field("pause_depth", &state.pause_depth)
            .finish()
    }
}

/// Guard returned by [`ChangeTracker::pause`]
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct RecordingPause<S> {
    state: Rc<RefCell<TrackerState<S>>>,
}

impl<S> Drop for RecordingPause<S> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pause_depth = state.pause_depth.saturating_sub(1);
    }
}
