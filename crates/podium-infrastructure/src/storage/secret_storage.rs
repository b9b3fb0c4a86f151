//! Secret configuration file storage.
//!
//! Provides loading of secret configuration from ~/.config/podium/secret.json.

use podium_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::paths::PodiumPaths;

/// Errors that can occur during secret storage operations.
#[derive(Debug, Error)]
pub enum SecretStorageError {
    /// Configuration file not found.
    #[error("Secret file not found at: {}", .0.display())]
    NotFound(PathBuf),
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Config directory not found.
    #[error("Could not determine the config directory")]
    ConfigDirNotFound,
}

impl SecretStorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Storage for the secret configuration file (secret.json).
///
/// Responsibilities:
/// - Load secret.json from ~/.config/podium/
/// - Parse JSON into `SecretConfig`
///
/// Does NOT:
/// - Write or modify secret files (read-only)
/// - Validate API keys against the provider
#[derive(Debug, Clone)]
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a SecretStorage with the default path (~/.config/podium/secret.json).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = PodiumPaths::default()
            .secret_file()
            .map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a SecretStorage with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration from the JSON file.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded and parsed
    /// - `Err(SecretStorageError::NotFound)`: File doesn't exist
    /// - `Err(SecretStorageError::Io)`: Failed to read file
    /// - `Err(SecretStorageError::Parse)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Like [`SecretStorage::load`], but a missing file is an empty config.
    pub fn load_or_default(&self) -> Result<SecretConfig, SecretStorageError> {
        match self.load() {
            Err(err) if err.is_not_found() => Ok(SecretConfig::default()),
            other => other,
        }
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
