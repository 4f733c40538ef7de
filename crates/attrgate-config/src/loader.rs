//! Configuration loader with multi-source merging

use crate::{AttrgateConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    base_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with the current directory as base
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "ATTRGATE".to_string(),
            include_user_config: true,
        }
    }

    /// Set the directory holding attrgate.toml and attrgate.local.toml
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "ATTRGATE")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/attrgate/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<AttrgateConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = AttrgateConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/attrgate/config.toml)
        // 3. Deployment config (attrgate.toml)
        // 4. Local config (attrgate.local.toml)
        let mut files = Vec::new();
        if self.include_user_config {
            if let Ok(user_config_file) = Paths::new().user_config_file() {
                files.push(user_config_file);
            }
        }
        files.push(Paths::deployment_config_file(&self.base_dir));
        files.push(Paths::local_config_file(&self.base_dir));

        for file in files.into_iter().filter(|f| f.exists()) {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (ATTRGATE_ENGINE__ID, ATTRGATE_LOGGING__FILTER, ...)
        // Double underscore separates sections since keys contain underscores.
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let attrgate_config: AttrgateConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        attrgate_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(attrgate_config)
    }

    /// Load configuration or return defaults if loading fails
    pub fn load_or_default(self) -> AttrgateConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
