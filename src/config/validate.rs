// src/config/validate.rs

use crate::config::model::{DestinationKind, JobConfig};
use crate::errors::{Result, SyncError};

/// Semantic validation of a single job.
///
/// The command builder assumes non-empty paths; that assumption is enforced
/// here, once, at load time, rather than re-checked on every build.
pub fn validate_job(job: &JobConfig) -> Result<()> {
    ensure_has_sources(job)?;
    ensure_has_destination(job)?;
    validate_kind(job)?;
    Ok(())
}

fn ensure_has_sources(job: &JobConfig) -> Result<()> {
    if job.sources.is_empty() {
        return Err(SyncError::ConfigError(format!(
            "job '{}' must list at least one source path",
            job.name
        )));
    }
    for src in job.sources.iter() {
        if src.trim().is_empty() {
            return Err(SyncError::ConfigError(format!(
                "job '{}' has an empty source path",
                job.name
            )));
        }
    }
    Ok(())
}

fn ensure_has_destination(job: &JobConfig) -> Result<()> {
    if job.destination.trim().is_empty() {
        return Err(SyncError::ConfigError(format!(
            "job '{}' has an empty destination path",
            job.name
        )));
    }
    Ok(())
}

fn validate_kind(job: &JobConfig) -> Result<()> {
    match &job.kind {
        DestinationKind::Local => Ok(()),
        DestinationKind::ScopedCloudFolder { bookmark } => {
            // A missing bookmark is legal here: the grant is obtained
            // out-of-band and its absence is reported as AccessNotGranted
            // at run time. An empty string, though, is a config mistake.
            if let Some(token) = bookmark {
                if token.trim().is_empty() {
                    return Err(SyncError::ConfigError(format!(
                        "job '{}' has an empty scoped-access bookmark",
                        job.name
                    )));
                }
            }
            Ok(())
        }
        DestinationKind::RemoteSsh { host, user, key_path } => {
            if host.trim().is_empty() {
                return Err(SyncError::ConfigError(format!(
                    "job '{}' has an empty SSH host",
                    job.name
                )));
            }
            if user.trim().is_empty() {
                return Err(SyncError::ConfigError(format!(
                    "job '{}' has an empty SSH user",
                    job.name
                )));
            }
            if let Some(key) = key_path {
                if key.trim().is_empty() {
                    return Err(SyncError::ConfigError(format!(
                        "job '{}' has an empty SSH key path",
                        job.name
                    )));
                }
            }
            Ok(())
        }
    }
}
