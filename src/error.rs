//! Error types for flow node storage.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the node storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The node file does not exist. Only `get_node` and `load_actions` treat this as absence.
    #[error("Flow node file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load flow node from {}: {content}", path.display())]
    CorruptRecord { path: PathBuf, content: String },

    #[error("Malformed flow node record {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A decoded parent reference has no recorded id. The parent graph cannot be trusted.
    #[error("Parent #{position} of flow node {node} has no recorded id")]
    UnresolvedParent { node: String, position: usize },

    #[error("Failed to install execution back-reference on flow node {0}")]
    BackReference(String),

    #[error("Invalid flow node id: {0:?}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Failures while loading configuration or installing the log subscriber.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
