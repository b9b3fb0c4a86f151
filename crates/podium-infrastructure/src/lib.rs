//! Filesystem concerns: platform paths, engine configuration and secrets.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use paths::{CONFIG_ENV_VAR, PathError, PodiumPaths};
pub use storage::{SecretStorage, SecretStorageError};
