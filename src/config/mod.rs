// src/config/mod.rs

//! Configuration loading and validation for archivist.
//!
//! - `model.rs`: TOML-backed raw model plus the validated `ConfigFile`.
//! - `loader.rs`: read from disk, apply env overrides.
//! - `validate.rs`: `RawConfigFile -> ConfigFile` conversion.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, defaults_from_env, load_and_validate, load_from_path};
pub use model::{
    BinariesSection, BinaryPaths, CallbackConfig, ConfigFile, ConfigSection, Placement,
    RawConfigFile, ShellSpec,
};
pub use validate::parse_duration;
