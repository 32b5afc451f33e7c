//! ConfigLoader: defaults, then file, then environment.

use super::{FlowStoreConfig, DEFAULT_CACHE_CAPACITY};
use crate::error::SetupError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::path::Path;

pub const ENV_PREFIX: &str = "FLOWSTORE";

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.avoid_atomic_write", false)?
        .set_default("storage.cache_capacity", DEFAULT_CACHE_CAPACITY as i64)
}

/// With the default prefix, `FLOWSTORE__STORAGE__CACHE_CAPACITY=128` sets
/// `storage.cache_capacity`.
fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults with environment overlay.
    pub fn load() -> Result<FlowStoreConfig, SetupError> {
        Self::load_with_env_prefix(ENV_PREFIX)
    }

    /// Defaults overlaid with variables named `<prefix>__SECTION__KEY`.
    pub fn load_with_env_prefix(prefix: &str) -> Result<FlowStoreConfig, SetupError> {
        let config = builder_with_defaults()?.add_source(environment(prefix)).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load a specific file with environment overlay. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<FlowStoreConfig, SetupError> {
        if !path.is_file() {
            return Err(SetupError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = builder_with_defaults()?
            .add_source(File::from(path))
            .add_source(environment(ENV_PREFIX))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
