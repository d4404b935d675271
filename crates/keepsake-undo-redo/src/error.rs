//! Error types for the undo/redo engine

use thiserror::Error;

use crate::models::ObjectId;

/// Errors that can occur in the undo/redo engine
///
/// History boundaries (nothing to undo or redo) are not errors; the engine
/// reports them as `Ok(false)`. Everything here is either a broken snapshot
/// contract or a bad configuration.
#[derive(Debug, Error)]
pub enum UndoRedoError {
    /// A snapshot was handed to an object of a different shape
    #[error("Snapshot mismatch for object {id}: {message}")]
    SnapshotMismatch {
        /// Object the snapshot was applied to
        id: ObjectId,
        /// What did not line up
        message: String,
    },

    /// A record needs a live object the registry cannot resolve
    #[error("Object {id} is not live")]
    MissingObject {
        /// Object that was expected in the registry
        id: ObjectId,
    },

    /// A batch replay could not be completed
    #[error("Replay of version {version} failed at object {id}: {source}")]
    ReplayFailed {
        /// Version of the changeset being replayed
        version: u64,
        /// Object whose restore failed
        id: ObjectId,
        /// Underlying contract violation
        #[source]
        source: Box<UndoRedoError>,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl UndoRedoError {
    /// Create a new SnapshotMismatch error with context
    pub fn snapshot_mismatch(id: ObjectId, msg: impl Into<String>) -> Self {
        Self::SnapshotMismatch {
            id,
            message: msg.into(),
        }
    }

    /// Create a new MissingObject error
    pub fn missing_object(id: ObjectId) -> Self {
        Self::MissingObject { id }
    }

    /// Wrap a contract violation raised while replaying a changeset
    pub fn replay_failed(version: u64, id: ObjectId, source: UndoRedoError) -> Self {
        Self::ReplayFailed {
            version,
            id,
            source: Box::new(source),
        }
    }

    /// Create a new ValidationError with context
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new ConfigError with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this error came from a broken snapshot contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::SnapshotMismatch { .. } | Self::MissingObject { .. } | Self::ReplayFailed { .. }
        )
    }
}

/// Result type for undo/redo operations
pub type Result<T> = std::result::Result<T, UndoRedoError>;
