// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only request-level failures travel through these types. Failures inside a
//! running job (stream reads, callbacks, termination) are recorded on the job
//! itself and show up through polling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchivistError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job already exists: {0}")]
    DuplicateJob(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ArchivistError>;
