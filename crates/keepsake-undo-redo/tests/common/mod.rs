//! Scene-node model shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use keepsake_undo_redo::{
    ChangeTracker, HistoryConfig, InMemoryRegistry, ObjectId, ObjectRegistry, Result,
    UndoRedoEngine, UndoRedoError, Versioned,
};

/// Immutable node state; children are referenced by id only
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub name: String,
    pub position: (i32, i32),
    pub children: Vec<ObjectId>,
}

#[derive(Debug)]
pub struct Node {
    id: ObjectId,
    pub state: NodeState,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Node {
            id: ObjectId::new(),
            state: NodeState {
                name: name.to_string(),
                position: (0, 0),
                children: Vec::new(),
            },
        }
    }
}

impl Versioned for Node {
    type Snapshot = Arc<NodeState>;

    fn id(&self) -> ObjectId {
        self.id
    }

    fn snapshot(&self) -> Arc<NodeState> {
        Arc::new(self.state.clone())
    }

    fn restore(&mut self, snapshot: &Arc<NodeState>) -> Result<()> {
        if snapshot.name.is_empty() {
            return Err(UndoRedoError::snapshot_mismatch(self.id, "nameless node"));
        }
        self.state = NodeState::clone(snapshot);
        Ok(())
    }

    fn materialize(id: ObjectId, snapshot: &Arc<NodeState>) -> Result<Self> {
        Ok(Node {
            id,
            state: NodeState::clone(snapshot),
        })
    }
}

/// Route engine logs through the test harness; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One editing session: model, feed and history wired together
pub struct Session {
    pub tracker: ChangeTracker<Arc<NodeState>>,
    pub registry: InMemoryRegistry<Node>,
    pub engine: UndoRedoEngine<Arc<NodeState>>,
}

impl Session {
    pub fn open() -> Self {
        Self::open_with(HistoryConfig::unbounded())
    }

    pub fn open_with(config: HistoryConfig) -> Self {
        init_tracing();
        let tracker = ChangeTracker::new();
        Session {
            engine: UndoRedoEngine::with_config(tracker.clone(), config).expect("valid config"),
            registry: InMemoryRegistry::new(),
            tracker,
        }
    }

    pub fn load(&mut self, node: Node) -> ObjectId {
        let id = node.id();
        self.engine.track_existing(&node);
        self.registry.register(node);
        id
    }

    pub fn create(&mut self, name: &str) -> ObjectId {
        let node = Node::new(name);
        let id = node.id();
        self.tracker.on_mutation(&node);
        self.registry.register(node);
        id
    }

    pub fn edit(&mut self, id: ObjectId, f: impl FnOnce(&mut NodeState)) {
        let node = self.registry.get_mut(&id).expect("node is live");
        f(&mut node.state);
        self.tracker.on_mutation(node);
    }

    pub fn delete(&mut self, id: ObjectId) {
        self.registry.unregister(&id);
        self.tracker.on_deleted(id);
    }

    pub fn state(&self, id: ObjectId) -> Option<NodeState> {
        self.registry.get(&id).map(|n| n.state.clone())
    }

    pub fn undo(&mut self) -> bool {
        self.engine.undo(&mut self.registry).expect("undo succeeds")
    }

    pub fn redo(&mut self) -> bool {
        self.engine.redo(&mut self.registry).expect("redo succeeds")
    }
}
