//! Configuration service implementation.
//!
//! Loads the engine configuration from `config.toml`, resolved in priority
//! order from an explicit path, `$PODIUM_CONFIG`, then the platform config
//! directory (`~/.config/podium/config.toml`).

use podium_core::config::EngineConfig;
use podium_core::error::{PodiumError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::paths::{CONFIG_ENV_VAR, PodiumPaths};

/// Configuration service that loads and caches the engine configuration.
///
/// A missing file yields the defaults; a file that exists but does not parse
/// or validate is an error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    explicit_path: Option<PathBuf>,
    paths: PodiumPaths,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<EngineConfig>>>,
}

impl ConfigService {
    /// Creates a service that resolves the file lazily on first access.
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self::with_paths(explicit_path, PodiumPaths::default())
    }

    pub fn with_paths(explicit_path: Option<PathBuf>, paths: PodiumPaths) -> Self {
        Self {
            explicit_path,
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Path the configuration is read from, if one can be determined.
    pub fn config_path(&self) -> Option<PathBuf> {
        resolve_config_path(
            self.explicit_path.as_deref(),
            std::env::var(CONFIG_ENV_VAR).ok(),
            &self.paths,
        )
    }

    /// Gets the configuration, loading it from file if not cached.
    pub fn get_config(&self) -> Result<EngineConfig> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = match self.config_path() {
            Some(path) => Self::load_from(&path)?,
            None => {
                tracing::debug!("No config location available, using defaults");
                EngineConfig::default()
            }
        };

        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = None;
    }

    /// Reads and validates one config file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<EngineConfig> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(EngineConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = EngineConfig::from_toml_str(&content).map_err(|err| match err {
            PodiumError::Config(message) => {
                PodiumError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        tracing::info!(path = %path.display(), "Loaded engine configuration");
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(None)
    }
}

fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<String>,
    paths: &PodiumPaths,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    paths.config_file().ok()
}
