//! Configuration
//!
//! Settings for the node store and its logging. Values come from built-in defaults, an
//! optional TOML file, and `FLOWSTORE__*` environment variables, in increasing precedence.

pub mod loader;

pub use loader::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Node store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Write node files in place instead of temp file + rename
    #[serde(default)]
    pub avoid_atomic_write: bool,

    /// Cached node count above which unreferenced nodes are dropped (0: never)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            avoid_atomic_write: false,
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowStoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
