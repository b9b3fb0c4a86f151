//! Unified path management for podium configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/podium/            # Config directory (dirs::config_dir)
//! ├── config.toml              # Engine configuration
//! └── secret.json              # API keys
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that points at an alternative `config.toml`.
pub const CONFIG_ENV_VAR: &str = "PODIUM_CONFIG";

const APP_DIR: &str = "podium";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Platform config directory could not be determined.
    #[error("Cannot find the platform config directory")]
    ConfigDirNotFound,
}

/// Path resolution for podium.
///
/// `base` replaces the platform config directory, which keeps tests away
/// from the real home directory.
#[derive(Debug, Clone, Default)]
pub struct PodiumPaths {
    base: Option<PathBuf>,
}

impl PodiumPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the podium configuration directory (e.g. `~/.config/podium/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to `secret.json`.
    ///
    /// # Security Note
    ///
    /// The file holds plaintext API keys and should be readable by its owner
    /// only (e.g. mode 600).
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }
}
