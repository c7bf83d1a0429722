// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A run is already active on this executor instance (single-flight).
    #[error("a sync run is already in progress on this executor")]
    AlreadyRunning,

    /// The external process could not be spawned, or terminated abnormally
    /// without ever producing an exit status.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The destination requires a scoped-access grant that was never
    /// obtained. The grant must be acquired out-of-band before execution.
    #[error("no access grant for destination; re-select the folder to grant access")]
    AccessNotGranted,

    /// The scoped destination could not be resolved or reached.
    #[error("destination unavailable: {0}")]
    DestinationUnavailable(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SyncError>;
