//! Live object registry and reactive binding hooks

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::models::{ObjectId, Versioned};

/// The host's view of live objects, as seen by the engine
///
/// Undo and redo resolve every record through this trait by id and use
/// `register` / `unregister` for records that create or delete objects.
pub trait ObjectRegistry {
    /// Concrete object type held by the registry
    type Object: Versioned;

    /// Look up the live instance for an id
    fn resolve(&self, id: &ObjectId) -> Option<&Self::Object>;

    /// Look up the live instance for an id, mutably
    fn resolve_mut(&mut self, id: &ObjectId) -> Option<&mut Self::Object>;

    /// Add a live instance, replacing any instance with the same id
    fn register(&mut self, object: Self::Object);

    /// Remove the live instance for an id
    fn unregister(&mut self, id: &ObjectId) -> Option<Self::Object>;

    /// Stop derived-state recomputation until `resume_bindings` is called
    fn suspend_bindings(&mut self) {}

    /// Resume derived-state recomputation and re-run it once for `touched`
    fn resume_bindings(&mut self, _touched: &[ObjectId]) {}
}

type RerunHook = Box<dyn FnMut(&[ObjectId])>;

/// HashMap-backed registry
///
/// Good enough for tools and tests that keep their whole model in memory.
/// An optional rerun hook stands in for mirrored representations that must be
/// refreshed after a replay.
pub struct InMemoryRegistry<V> {
    objects: HashMap<ObjectId, V>,
    suspended: bool,
    rerun_hook: Option<RerunHook>,
}

impl<V: Versioned> InMemoryRegistry<V> {
    /// Create an empty registry
    pub fn new() -> Self {
        InMemoryRegistry {
            objects: HashMap::new(),
            suspended: false,
            rerun_hook: None,
        }
    }

    /// Install a hook called once per resumed replay with the touched ids
    pub fn with_rerun_hook(mut self, hook: impl FnMut(&[ObjectId]) + 'static) -> Self {
        self.rerun_hook = Some(Box::new(hook));
        self
    }

    /// Get a live object
    pub fn get(&self, id: &ObjectId) -> Option<&V> {
        self.objects.get(id)
    }

    /// Get a live object mutably
    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut V> {
        self.objects.get_mut(id)
    }

    /// Check whether an id is live
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Ids of all live objects, in no particular order
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Iterate over live objects
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.objects.values()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether binding recomputation is currently suspended
    pub fn bindings_suspended(&self) -> bool {
        self.suspended
    }
}

impl<V: Versioned> Default for InMemoryRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for InMemoryRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("objects", &self.objects.len())
            .field("suspended", &self.suspended)
            .field("rerun_hook", &self.rerun_hook.is_some())
            .finish()
    }
}

impl<V: Versioned> ObjectRegistry for InMemoryRegistry<V> {
    type Object = V;

    fn resolve(&self, id: &ObjectId) -> Option<&V> {
        self.objects.get(id)
    }

    fn resolve_mut(&mut self, id: &ObjectId) -> Option<&mut V> {
        self.objects.get_mut(id)
    }

    fn register(&mut self, object: V) {
        trace!(id = %object.id(), "register");
        self.objects.insert(object.id(), object);
    }

    fn unregister(&mut self, id: &ObjectId) -> Option<V> {
        trace!(id = %id, "unregister");
        self.objects.remove(id)
    }

    fn suspend_bindings(&mut self) {
        self.suspended = true;
    }

    fn resume_bindings(&mut self, touched: &[ObjectId]) {
        self.suspended = false;
        if let Some(hook) = self.rerun_hook.as_mut() {
            hook(touched);
        }
    }
}
