//! History configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UndoRedoError};
use crate::merge::{MergePolicy, NeverMerge, TimeWindowMerge};

/// Largest accepted merge window: one hour
pub const MAX_MERGE_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Merge policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Coalesce rapid edits of the same objects into one history entry
    pub enabled: bool,
    /// Maximum gap between two ticks that may still merge, in milliseconds
    pub window_ms: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_ms: 300,
        }
    }
}

/// Undo/redo history configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undoable entries, baseline excluded; `None` is unbounded
    pub max_undo_depth: Option<usize>,
    /// Merge policy settings
    pub merge: MergeConfig,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: Some(100),
            merge: MergeConfig::default(),
        }
    }
}

impl HistoryConfig {
    /// Configuration with no depth limit
    pub fn unbounded() -> Self {
        Self {
            max_undo_depth: None,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HistoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading history config");
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_undo_depth == Some(0) {
            return Err(UndoRedoError::config_error(
                "max_undo_depth must be at least 1",
            ));
        }
        if self.merge.enabled && self.merge.window_ms == 0 {
            return Err(UndoRedoError::config_error(
                "merge.window_ms must be positive when merging is enabled",
            ));
        }
        if self.merge.window_ms > MAX_MERGE_WINDOW_MS {
            return Err(UndoRedoError::config_error(format!(
                "merge.window_ms must not exceed {} ms",
                MAX_MERGE_WINDOW_MS
            )));
        }
        Ok(())
    }

    /// Build the merge policy described by this configuration
    pub fn merge_policy<S>(&self) -> Box<dyn MergePolicy<S>> {
        if self.merge.enabled {
            Box::new(TimeWindowMerge::with_millis(self.merge.window_ms))
        } else {
            Box::new(NeverMerge)
        }
    }
}
