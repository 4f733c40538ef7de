//! Configuration management for attrgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (ATTRGATE_* prefix, highest precedence)
//! 2. attrgate.local.toml (local overrides, not checked in)
//! 3. attrgate.toml (deployment config)
//! 4. ~/.config/attrgate/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main attrgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttrgateConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Settings applied to the filter engine and the components built for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Component id of the engine, used in logs.
    pub id: String,
    /// What an OR matcher returns when every child fails.
    pub or_matcher_all_failed: OrMatcherAllFailed,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id: "attribute-filter".to_string(),
            or_matcher_all_failed: OrMatcherAllFailed::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrMatcherAllFailed {
    /// The matcher fails (nothing released, logged).
    #[default]
    Fail,
    /// The matcher matches no values.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
            with_target: false,
        }
    }
}

impl AttrgateConfig {
    /// Load configuration from default locations
    pub fn load() -> anyhow::Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from a specific deployment directory
    pub fn load_from_dir(base_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        ConfigLoader::new().with_base_dir(base_dir).load()
    }

    /// Read a single TOML file without any layering.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "engine.id must not be empty".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
