// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a config file, apply environment overrides and validate it.
///
/// This is the entry point the binary uses; tests usually go through
/// `ConfigFile::try_from` directly so the environment does not leak in.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw = load_from_path(&path)?.with_env_overrides();
    debug!(path = ?path.as_ref(), callbacks = raw.callback.len(), "config loaded");
    ConfigFile::try_from(raw)
}

/// Built-in defaults plus environment overrides, for runs without a file.
pub fn defaults_from_env() -> Result<ConfigFile> {
    ConfigFile::try_from(RawConfigFile::default().with_env_overrides())
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Archivist.toml")
}
