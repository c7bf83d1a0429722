// src/config/model.rs

//! Job configuration model.
//!
//! The TOML file holds one `[job.<name>]` table per sync job:
//!
//! ```toml
//! [job.nightly]
//! sources = ["~/Documents/"]
//! destination = "/mnt/backup/documents"
//! options = { "--archive" = "", "--compress" = "" }
//!
//! [job.nightly.kind]
//! type = "remote_ssh"
//! host = "backup.example.com"
//! user = "backup"
//! key_path = "~/.ssh/id_backup"
//! ```
//!
//! `RawJobFile` is the shape `serde` deserializes; `JobFile` / `JobConfig`
//! are the validated forms the rest of the crate consumes. Conversion runs
//! through `TryFrom`, which applies the semantic checks in [`validate`].
//!
//! [`validate`]: crate::config::validate

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::validate;
use crate::errors::SyncError;

/// Where a job's destination lives.
///
/// The variant carries the fields that only make sense for that kind, so a
/// job can never have, say, SSH fields and a sandbox bookmark at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DestinationKind {
    /// A plain local path, no special access handling.
    Local,
    /// A sandbox-gated folder (e.g. a cloud drive mount) reachable only
    /// through a previously obtained access bookmark.
    ScopedCloudFolder {
        /// Opaque token handed to the `ScopedAccess` implementation.
        /// Absent means the grant was never obtained.
        bookmark: Option<String>,
    },
    /// A remote destination reached over SSH.
    RemoteSsh {
        host: String,
        user: String,
        /// Private key passed to `ssh -i`; omitted to use the default agent.
        key_path: Option<String>,
    },
}

impl Default for DestinationKind {
    fn default() -> Self {
        DestinationKind::Local
    }
}

/// One job as written in the TOML file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobConfig {
    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub destination: String,

    #[serde(default)]
    pub kind: DestinationKind,

    /// Extra flags handed to the transfer tool, flag -> optional argument
    /// (empty string means the flag takes no argument). A `BTreeMap` keeps
    /// the resulting argument order deterministic.
    #[serde(default = "default_options")]
    pub options: BTreeMap<String, String>,

    /// Override for the transfer executable; defaults to `rsync` on `$PATH`.
    #[serde(default)]
    pub rsync_path: Option<PathBuf>,
}

/// Default option set for new jobs: archive mode plus the verbose output
/// the progress parser and result finalizer feed on.
pub fn default_options() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("--archive".to_string(), String::new()),
        ("--progress".to_string(), String::new()),
        ("--stats".to_string(), String::new()),
        ("--verbose".to_string(), String::new()),
    ])
}

/// Whole config file as deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobFile {
    #[serde(default)]
    pub job: BTreeMap<String, RawJobConfig>,
}

/// A validated, immutable job snapshot. Borrowed by the executor for the
/// duration of one run; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub name: String,
    pub sources: Vec<String>,
    pub destination: String,
    pub kind: DestinationKind,
    pub options: BTreeMap<String, String>,
    pub rsync_path: Option<PathBuf>,
}

/// Validated config file: named jobs, ready to execute.
#[derive(Debug, Clone)]
pub struct JobFile {
    pub jobs: BTreeMap<String, JobConfig>,
}

impl TryFrom<RawJobFile> for JobFile {
    type Error = SyncError;

    fn try_from(raw: RawJobFile) -> Result<Self, Self::Error> {
        let mut jobs = BTreeMap::new();
        for (name, raw_job) in raw.job {
            let job = JobConfig {
                name: name.clone(),
                sources: raw_job.sources,
                destination: raw_job.destination,
                kind: raw_job.kind,
                options: raw_job.options,
                rsync_path: raw_job.rsync_path,
            };
            validate::validate_job(&job)?;
            jobs.insert(name, job);
        }
        Ok(JobFile { jobs })
    }
}

impl JobFile {
    /// Select a job by name, or the only job when the file defines exactly
    /// one and no name was given.
    pub fn select(&self, name: Option<&str>) -> Result<&JobConfig, SyncError> {
        match name {
            Some(n) => self
                .jobs
                .get(n)
                .ok_or_else(|| SyncError::JobNotFound(n.to_string())),
            None => {
                let mut it = self.jobs.values();
                match (it.next(), it.next()) {
                    (Some(job), None) => Ok(job),
                    _ => Err(SyncError::ConfigError(format!(
                        "config defines {} jobs; pass --job <NAME> to pick one",
                        self.jobs.len()
                    ))),
                }
            }
        }
    }
}
