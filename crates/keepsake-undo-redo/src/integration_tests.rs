#[cfg(test)]
mod integration_tests_suite {
    use crate::fixtures::{Counter, CounterSnapshot};
    use crate::{
        ChangeKind, ChangeTracker, HistoryConfig, InMemoryRegistry, ObjectRegistry,
        UndoRedoEngine, Versioned,
    };

    /// Test complete workflow (edit → tick → undo → redo)
    #[test]
    fn test_complete_undo_redo_workflow() {
        let tracker: ChangeTracker<CounterSnapshot> = ChangeTracker::new();
        let mut engine =
            UndoRedoEngine::with_config(tracker.clone(), HistoryConfig::unbounded()).unwrap();
        let mut registry = InMemoryRegistry::new();

        let existing = Counter::labeled(1, "existing");
        let existing_id = existing.id();
        engine.track_existing(&existing);
        registry.register(existing);

        // Tick 1: create a second object
        let created = Counter::labeled(10, "created");
        let created_id = created.id();
        tracker.on_mutation(&created);
        registry.register(created);
        engine.tick();

        // Tick 2: edit both objects
        registry.get_mut(&existing_id).unwrap().set(2, &tracker);
        registry.get_mut(&created_id).unwrap().set(11, &tracker);
        engine.tick();

        // Tick 3: delete the existing object
        registry.unregister(&existing_id);
        tracker.on_deleted(existing_id);
        engine.tick();

        let entries = engine.history().entries(10, 0);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].objects, vec![existing_id, created_id]);
        let latest = engine.history().latest().unwrap();
        assert_eq!(latest.get(&existing_id).map(|r| r.kind()), Some(ChangeKind::Delete));

        // Undo everything
        assert!(engine.undo(&mut registry).unwrap());
        assert_eq!(registry.get(&existing_id).map(|c| c.value), Some(2));
        assert!(engine.undo(&mut registry).unwrap());
        assert_eq!(registry.get(&existing_id).map(|c| c.value), Some(1));
        assert_eq!(registry.get(&created_id).map(|c| c.value), Some(10));
        assert!(engine.undo(&mut registry).unwrap());
        assert!(!registry.contains(&created_id));
        assert!(!engine.undo(&mut registry).unwrap());

        // Redo everything
        while engine.redo(&mut registry).unwrap() {}
        assert!(!registry.contains(&existing_id));
        assert_eq!(registry.get(&created_id).map(|c| c.value), Some(11));
        assert_eq!(engine.history().undoable_count(), 3);
    }

    /// Test flushing a reloaded object mid-history
    #[test]
    fn test_flush_after_external_reload() {
        let tracker: ChangeTracker<CounterSnapshot> = ChangeTracker::new();
        let mut engine = UndoRedoEngine::new(tracker.clone());
        let mut registry = InMemoryRegistry::new();

        let asset = Counter::labeled(1, "asset");
        let other = Counter::labeled(1, "other");
        let (asset_id, other_id) = (asset.id(), other.id());
        engine.track_existing(&asset);
        engine.track_existing(&other);
        registry.register(asset);
        registry.register(other);

        registry.get_mut(&asset_id).unwrap().set(2, &tracker);
        registry.get_mut(&other_id).unwrap().set(2, &tracker);
        engine.tick();

        // backing store reloaded behind the engine's back
        let reloaded = registry.resolve_mut(&asset_id).unwrap();
        reloaded.value = 50;
        reloaded.label = "asset (reloaded)".to_string();
        engine.flush_changes(&registry, [asset_id]);

        assert!(engine.history().changes_for(&asset_id).is_empty());
        assert_eq!(engine.history().changes_for(&other_id).len(), 1);

        assert!(engine.undo(&mut registry).unwrap());
        let asset = registry.get(&asset_id).unwrap();
        assert_eq!(asset.value, 50);
        assert_eq!(asset.label, "asset (reloaded)");
        assert_eq!(registry.get(&other_id).map(|c| c.value), Some(1));
    }
}
