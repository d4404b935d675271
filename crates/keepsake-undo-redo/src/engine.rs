//! Undo/redo engine: ticks, bulk replay and history flushing

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, trace};

use crate::change::{ChangeRecord, Changeset};
use crate::config::HistoryConfig;
use crate::error::{Result, UndoRedoError};
use crate::history::HistoryStacks;
use crate::merge::MergePolicy;
use crate::models::{ObjectId, Versioned};
use crate::registry::ObjectRegistry;
use crate::tracker::ChangeTracker;

/// What a tick did to the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed since the previous tick
    Idle,
    /// Changes were folded into the latest entry
    Merged {
        /// Version of the entry that absorbed the changes
        version: u64,
    },
    /// A new entry was pushed
    Recorded {
        /// Version of the new entry
        version: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn target<'a, S>(&self, record: &'a ChangeRecord<S>) -> Option<&'a S> {
        match self {
            Direction::Undo => record.prev.as_ref(),
            Direction::Redo => record.next.as_ref(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Direction::Undo => "undo",
            Direction::Redo => "redo",
        }
    }
}

/// Versioned undo/redo over a live object graph
///
/// The engine owns the history and one handle to the [`ChangeTracker`]; the
/// model owns the other handle and the [`ObjectRegistry`], which is passed in
/// explicitly to every call that touches live objects. All calls are
/// synchronous and expected on the host's update thread.
pub struct UndoRedoEngine<S> {
    tracker: ChangeTracker<S>,
    history: HistoryStacks<S>,
    merge_policy: Box<dyn MergePolicy<S>>,
    config: HistoryConfig,
}

impl<S: Clone> UndoRedoEngine<S> {
    /// Create an engine with the default configuration
    pub fn new(tracker: ChangeTracker<S>) -> Self {
        Self::build(tracker, HistoryConfig::default())
    }

    /// Create an engine with configuration
    ///
    /// The configuration is validated first, so hand-built values get the
    /// same checks as the JSON loaders.
    pub fn with_config(tracker: ChangeTracker<S>, config: HistoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(tracker, config))
    }

    fn build(tracker: ChangeTracker<S>, config: HistoryConfig) -> Self {
        UndoRedoEngine {
            tracker,
            history: HistoryStacks::new(),
            merge_policy: config.merge_policy(),
            config,
        }
    }

    /// Replace the merge policy
    pub fn with_merge_policy(mut self, policy: impl MergePolicy<S> + 'static) -> Self {
        self.merge_policy = Box::new(policy);
        self
    }

    /// Record an object's load-time state in the baseline
    pub fn track_existing<V>(&mut self, object: &V)
    where
        V: Versioned<Snapshot = S>,
    {
        let snapshot = object.snapshot();
        self.tracker.resync(object.id(), Some(snapshot.clone()));
        let version = self.history.version();
        self.history.baseline_mut().replace(ChangeRecord {
            version,
            id: object.id(),
            prev: None,
            next: Some(snapshot),
        });
    }

    /// Turn everything reported since the last tick into history
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Utc::now())
    }

    /// Same as [`tick`](Self::tick) with an explicit timestamp
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let changes = self.tracker.drain();
        if changes.is_empty() {
            return TickOutcome::Idle;
        }

        let incoming = Changeset::from_tracked(self.history.version() + 1, now, changes);
        if incoming.is_empty() {
            return TickOutcome::Idle;
        }

        // never merge into the baseline or across an undo
        if !self.history.can_redo() {
            if let Some(latest) = self.history.latest_mut() {
                if self.merge_policy.try_merge(latest, &incoming) {
                    let version = latest.version();
                    debug!(
                        version,
                        objects = incoming.len(),
                        policy = self.merge_policy.name(),
                        "merged tick into latest entry"
                    );
                    latest.absorb(incoming);
                    return TickOutcome::Merged { version };
                }
            }
        }

        let objects = incoming.len();
        let version = self.history.next_version();
        self.history.push(incoming);
        debug!(version, objects, "recorded history entry");

        if let Some(max_depth) = self.config.max_undo_depth {
            let dropped = self.history.trim_to(max_depth);
            if dropped > 0 {
                debug!(dropped, max_depth, "trimmed oldest history entries");
            }
        }

        TickOutcome::Recorded { version }
    }

    /// Revert the latest entry
    ///
    /// Pending changes are ticked first so they are what gets undone. Returns
    /// `Ok(false)` when only the baseline is left. A broken snapshot contract
    /// aborts the batch, leaves the entry on the undo side and returns the
    /// error.
    pub fn undo<R>(&mut self, registry: &mut R) -> Result<bool>
    where
        R: ObjectRegistry,
        R::Object: Versioned<Snapshot = S>,
    {
        self.tick();
        let Some(changeset) = self.history.pop_past() else {
            debug!("nothing to undo");
            return Ok(false);
        };

        match self.replay(registry, &changeset, Direction::Undo) {
            Ok(()) => {
                info!(
                    version = changeset.version(),
                    objects = changeset.len(),
                    "undo applied"
                );
                self.history.push_future(changeset);
                Ok(true)
            }
            Err(err) => {
                error!(version = changeset.version(), error = %err, "undo failed");
                self.history.push_past(changeset);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone entry
    ///
    /// Mirror of [`undo`](Self::undo). Pending changes are ticked first, which
    /// clears the redo side if there were any.
    pub fn redo<R>(&mut self, registry: &mut R) -> Result<bool>
    where
        R: ObjectRegistry,
        R::Object: Versioned<Snapshot = S>,
    {
        self.tick();
        let Some(changeset) = self.history.pop_future() else {
            debug!("nothing to redo");
            return Ok(false);
        };

        match self.replay(registry, &changeset, Direction::Redo) {
            Ok(()) => {
                info!(
                    version = changeset.version(),
                    objects = changeset.len(),
                    "redo applied"
                );
                self.history.push_past(changeset);
                Ok(true)
            }
            Err(err) => {
                error!(version = changeset.version(), error = %err, "redo failed");
                self.history.push_future(changeset);
                Err(err)
            }
        }
    }

    /// Fold the current state of `ids` into the baseline and erase their history
    ///
    /// Afterwards undo and redo no longer touch these objects, while other
    /// objects recorded in the same entries keep their history. Objects that
    /// are not live are dropped from the baseline. Returns the number of
    /// records removed from the stacks.
    pub fn flush_changes<R>(&mut self, registry: &R, ids: impl IntoIterator<Item = ObjectId>) -> usize
    where
        R: ObjectRegistry,
        R::Object: Versioned<Snapshot = S>,
    {
        let version = self.history.version();
        let mut flushed = 0;
        let mut removed = 0;

        for id in ids {
            self.tracker.discard(&id);
            match registry.resolve(&id) {
                Some(object) => {
                    let snapshot = object.snapshot();
                    self.tracker.resync(id, Some(snapshot.clone()));
                    self.history.baseline_mut().replace(ChangeRecord {
                        version,
                        id,
                        prev: None,
                        next: Some(snapshot),
                    });
                }
                None => {
                    self.tracker.resync(id, None);
                    self.history.baseline_mut().remove(&id);
                }
            }
            removed += self.history.strip(&id);
            flushed += 1;
        }

        info!(flushed, removed, "flushed object history");
        removed
    }

    fn replay<R>(&mut self, registry: &mut R, changeset: &Changeset<S>, direction: Direction) -> Result<()>
    where
        R: ObjectRegistry,
        R::Object: Versioned<Snapshot = S>,
    {
        let touched = changeset.ids();
        registry.suspend_bindings();

        let result = {
            let _pause = self.tracker.pause();
            let result = apply(registry, changeset, direction);
            let echoed = self.tracker.discard_pending();
            if echoed > 0 {
                trace!(echoed, direction = direction.as_str(), "discarded replay-induced changes");
            }
            result
        };

        // committed state follows whatever is live now, even after a partial replay
        for id in &touched {
            let live = registry.resolve(id).map(|object| object.snapshot());
            self.tracker.resync(*id, live);
        }

        registry.resume_bindings(&touched);
        result
    }

    /// Current history version
    pub fn version(&self) -> u64 {
        self.history.version()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The history stacks
    pub fn history(&self) -> &HistoryStacks<S> {
        &self.history
    }

    /// The engine's tracker handle
    pub fn tracker(&self) -> &ChangeTracker<S> {
        &self.tracker
    }

    /// Get the configuration
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Name of the active merge policy
    pub fn merge_policy_name(&self) -> &str {
        self.merge_policy.name()
    }
}

/// Apply one side of every record
///
/// Absent objects are materialized first so restores that resolve references
/// by id find them, then present objects are restored, then removals run.
fn apply<R, S>(registry: &mut R, changeset: &Changeset<S>, direction: Direction) -> Result<()>
where
    R: ObjectRegistry,
    R::Object: Versioned<Snapshot = S>,
{
    let version = changeset.version();

    // removals need their object live; check before anything is touched
    for record in changeset.records() {
        record
            .validate()
            .map_err(|err| UndoRedoError::replay_failed(version, record.id, err))?;
        if direction.target(record).is_none() && registry.resolve(&record.id).is_none() {
            return Err(UndoRedoError::replay_failed(
                version,
                record.id,
                UndoRedoError::missing_object(record.id),
            ));
        }
    }

    let mut materialized = HashSet::new();

    for record in changeset.records() {
        let Some(target) = direction.target(record) else {
            continue;
        };
        if registry.resolve(&record.id).is_none() {
            let object = <R::Object as Versioned>::materialize(record.id, target)
                .map_err(|err| UndoRedoError::replay_failed(version, record.id, err))?;
            if object.id() != record.id {
                return Err(UndoRedoError::replay_failed(
                    version,
                    record.id,
                    UndoRedoError::snapshot_mismatch(
                        record.id,
                        format!("materialized object reports id {}", object.id()),
                    ),
                ));
            }
            registry.register(object);
            materialized.insert(record.id);
        }
    }

    for record in changeset.records() {
        let Some(target) = direction.target(record) else {
            continue;
        };
        if materialized.contains(&record.id) {
            continue;
        }
        if let Some(object) = registry.resolve_mut(&record.id) {
            object
                .restore(target)
                .map_err(|err| UndoRedoError::replay_failed(version, record.id, err))?;
        }
    }

    for record in changeset.records() {
        if direction.target(record).is_none() && registry.unregister(&record.id).is_none() {
            return Err(UndoRedoError::replay_failed(
                version,
                record.id,
                UndoRedoError::missing_object(record.id),
            ));
        }
    }

    Ok(())
}
