//! Small versionable model used by the unit tests

use crate::error::{Result, UndoRedoError};
use crate::models::{ObjectId, Versioned};
use crate::tracker::ChangeTracker;

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSnapshot {
    pub shape: u8,
    pub value: i64,
    pub label: String,
}

/// Integer cell with a label
///
/// `shape` models the concrete type behind the snapshot: restoring a snapshot
/// of another shape is a contract violation. An echoing counter reports its
/// own restores back to a tracker, the way a careless model setter would.
#[derive(Debug)]
pub struct Counter {
    id: ObjectId,
    pub shape: u8,
    pub value: i64,
    pub label: String,
    echo: Option<ChangeTracker<CounterSnapshot>>,
}

impl Counter {
    pub fn new(value: i64) -> Self {
        Counter {
            id: ObjectId::new(),
            shape: 0,
            value,
            label: String::new(),
            echo: None,
        }
    }

    pub fn labeled(value: i64, label: &str) -> Self {
        Counter {
            label: label.to_string(),
            ..Counter::new(value)
        }
    }

    pub fn with_shape(mut self, shape: u8) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    pub fn echoing(mut self, tracker: &ChangeTracker<CounterSnapshot>) -> Self {
        self.echo = Some(tracker.clone());
        self
    }

    pub fn set(&mut self, value: i64, tracker: &ChangeTracker<CounterSnapshot>) {
        self.value = value;
        tracker.on_mutation(self);
    }
}

impl Versioned for Counter {
    type Snapshot = CounterSnapshot;

    fn id(&self) -> ObjectId {
        self.id
    }

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            shape: self.shape,
            value: self.value,
            label: self.label.clone(),
        }
    }

    fn restore(&mut self, snapshot: &CounterSnapshot) -> Result<()> {
        if snapshot.shape != self.shape {
            return Err(UndoRedoError::snapshot_mismatch(
                self.id,
                format!("expected shape {}, got {}", self.shape, snapshot.shape),
            ));
        }
        self.value = snapshot.value;
        self.label = snapshot.label.clone();
        if let Some(tracker) = &self.echo {
            tracker.on_mutation(self);
        }
        Ok(())
    }

    fn materialize(id: ObjectId, snapshot: &CounterSnapshot) -> Result<Self> {
        Ok(Counter {
            id,
            shape: snapshot.shape,
            value: snapshot.value,
            label: snapshot.label.clone(),
            echo: None,
        })
    }
}
