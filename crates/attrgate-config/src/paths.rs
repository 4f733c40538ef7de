//! Path utilities and XDG directory discovery

use crate::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// XDG-compliant paths for attrgate
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    /// Create a new Paths instance with XDG discovery
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("org", "attrgate", "attrgate"),
        }
    }

    /// Get user config directory (~/.config/attrgate/)
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::XdgError("Failed to determine user config directory".to_string())
            })
    }

    /// Get user config file path (~/.config/attrgate/config.toml)
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    /// Get deployment config file path (attrgate.toml)
    pub fn deployment_config_file(base_dir: impl AsRef<Path>) -> PathBuf {
        base_dir.as_ref().join("attrgate.toml")
    }

    /// Get local config file path (attrgate.local.toml, not checked in)
    pub fn local_config_file(base_dir: impl AsRef<Path>) -> PathBuf {
        base_dir.as_ref().join("attrgate.local.toml")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_xdg_paths() {
        let paths = Paths::new();

        // Platform dependent; only checks the application name is used
        if let Ok(config_file) = paths.user_config_file() {
            assert!(config_file.to_string_lossy().contains("attrgate"));
            assert!(config_file.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_deployment_paths() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let base_dir = temp_dir.path();

        assert_eq!(
            Paths::deployment_config_file(base_dir),
            base_dir.join("attrgate.toml")
        );
        assert_eq!(
            Paths::local_config_file(base_dir),
            base_dir.join("attrgate.local.toml")
        );
    }
}
