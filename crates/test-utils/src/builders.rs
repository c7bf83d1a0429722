#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use backsync::config::{DestinationKind, JobConfig};

/// Builder for `JobConfig` to simplify test setup.
///
/// Defaults to a local job with an empty option set, so built argument
/// vectors stay short and assertable.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                sources: vec![],
                destination: String::new(),
                kind: DestinationKind::Local,
                options: BTreeMap::new(),
                rsync_path: None,
            },
        }
    }

    pub fn source(mut self, path: &str) -> Self {
        self.job.sources.push(path.to_string());
        self
    }

    pub fn destination(mut self, path: &str) -> Self {
        self.job.destination = path.to_string();
        self
    }

    pub fn option(mut self, flag: &str, value: &str) -> Self {
        self.job.options.insert(flag.to_string(), value.to_string());
        self
    }

    pub fn scoped(mut self, bookmark: Option<&str>) -> Self {
        self.job.kind = DestinationKind::ScopedCloudFolder {
            bookmark: bookmark.map(|s| s.to_string()),
        };
        self
    }

    pub fn remote_ssh(mut self, host: &str, user: &str, key_path: Option<&str>) -> Self {
        self.job.kind = DestinationKind::RemoteSsh {
            host: host.to_string(),
            user: user.to_string(),
            key_path: key_path.map(|s| s.to_string()),
        };
        self
    }

    /// Point the job at a stand-in executable instead of real rsync.
    pub fn rsync_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.job.rsync_path = Some(path.into());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
