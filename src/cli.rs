// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `backsync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backsync",
    version,
    about = "Run rsync-backed sync jobs with live progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Defaults to [`default_config_path`] in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Name of the job to run. May be omitted when the file defines
    /// exactly one job.
    #[arg(long, value_name = "NAME")]
    pub job: Option<String>,

    /// Pass --dry-run to the transfer tool: report what would change
    /// without touching the destination.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BACKSYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_the_shared_default_path() {
        let args = CliArgs::try_parse_from(["backsync"]).unwrap();
        assert_eq!(args.config, default_config_path());
    }

    #[test]
    fn explicit_config_overrides_the_default() {
        let args =
            CliArgs::try_parse_from(["backsync", "--config", "jobs/Nightly.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("jobs/Nightly.toml"));
    }
}
