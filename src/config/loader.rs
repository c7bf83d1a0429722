// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (paths, destination kinds, etc.). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawJobFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a job file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks per-job invariants:
///   - non-empty sources and destination,
///   - remote fields present and non-empty for SSH destinations,
///   - bookmark token non-empty when present.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw = load_from_path(&path)?;
    let file = JobFile::try_from(raw)?;
    Ok(file)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Backsync.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `BACKSYNC_CONFIG`).
/// - Look for multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Backsync.toml")
}
