// src/exec/command.rs

//! Translation of a job snapshot into an rsync invocation.
//!
//! `build_command` is pure: it never touches the filesystem and never
//! mutates the job it is given. Empty source/destination paths are rejected
//! at config load time (`config::validate`), not here.

use std::path::PathBuf;

use crate::config::{DestinationKind, JobConfig};

/// Flag appended for dry runs. rsync reports what it *would* transfer
/// without touching the destination.
pub const DRY_RUN_FLAG: &str = "--dry-run";

/// Build the executable path and argument vector for one run.
///
/// Flags come first (rsync requires options before positional paths), in
/// the deterministic order of the job's `BTreeMap`, then the remote-shell
/// argument for SSH jobs, then sources, then the destination.
pub fn build_command(job: &JobConfig, dry_run: bool) -> (PathBuf, Vec<String>) {
    build_with_destination(job, &job.destination, dry_run)
}

/// Like [`build_command`], but with the destination path substituted.
///
/// Used for scoped destinations, where the access guard resolves the
/// bookmark to a concrete path before the command is built.
pub fn build_with_destination(
    job: &JobConfig,
    destination: &str,
    dry_run: bool,
) -> (PathBuf, Vec<String>) {
    let program = job
        .rsync_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("rsync"));

    let mut args: Vec<String> = Vec::new();

    // Work on a copy of the option set; the job snapshot stays untouched.
    let mut options = job.options.clone();
    if dry_run {
        options.entry(DRY_RUN_FLAG.to_string()).or_default();
    }
    for (flag, value) in options.iter() {
        args.push(flag.clone());
        if !value.is_empty() {
            args.push(value.clone());
        }
    }

    let sources: Vec<String> = job.sources.iter().map(|s| expand_home(s)).collect();
    let destination = expand_home(destination);

    match &job.kind {
        DestinationKind::RemoteSsh { host, user, key_path } => {
            let shell = match key_path {
                Some(key) => format!("ssh -i {}", expand_home(key)),
                None => "ssh".to_string(),
            };
            args.push("-e".to_string());
            args.push(shell);

            args.extend(sources);
            args.push(format!("{user}@{host}:{destination}"));
        }
        DestinationKind::Local | DestinationKind::ScopedCloudFolder { .. } => {
            // A trailing separator on the source means "copy the contents,
            // not the directory"; the destination must match or rsync
            // creates an extra nesting level.
            let destination = if sources.iter().any(|s| s.ends_with('/'))
                && !destination.ends_with('/')
            {
                format!("{destination}/")
            } else {
                destination
            };

            args.extend(sources);
            args.push(destination);
        }
    }

    (program, args)
}

/// Expand a leading `~` or `~/` using the `HOME` environment variable.
///
/// `~user` forms are passed through untouched; rsync accepts them literally
/// on the remote side.
pub fn expand_home(path: &str) -> String {
    match std::env::var("HOME") {
        Ok(home) => expand_home_with(path, &home),
        Err(_) => path.to_string(),
    }
}

fn expand_home_with(path: &str, home: &str) -> String {
    if path == "~" {
        home.to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{}", home.trim_end_matches('/'), rest)
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn local_job(source: &str, destination: &str) -> JobConfig {
        JobConfig {
            name: "test".to_string(),
            sources: vec![source.to_string()],
            destination: destination.to_string(),
            kind: DestinationKind::Local,
            options: BTreeMap::from([
                ("--archive".to_string(), String::new()),
                ("--progress".to_string(), String::new()),
            ]),
            rsync_path: None,
        }
    }

    #[test]
    fn flags_precede_paths_in_btreemap_order() {
        let (program, args) = build_command(&local_job("/data", "/backup"), false);
        assert_eq!(program, PathBuf::from("rsync"));
        assert_eq!(args, vec!["--archive", "--progress", "/data", "/backup"]);
    }

    #[test]
    fn dry_run_flag_added_without_mutating_job() {
        let job = local_job("/data", "/backup");
        let (_, args) = build_command(&job, true);
        assert!(args.contains(&DRY_RUN_FLAG.to_string()));
        // The job's stored option set is unchanged.
        assert!(!job.options.contains_key(DRY_RUN_FLAG));
    }

    #[test]
    fn trailing_separator_propagates_to_destination() {
        let (_, args) = build_command(&local_job("/data/", "/backup"), false);
        assert_eq!(args.last().unwrap(), "/backup/");

        // Already-trailing destination is left alone.
        let (_, args) = build_command(&local_job("/data/", "/backup/"), false);
        assert_eq!(args.last().unwrap(), "/backup/");

        // No trailing separator on the source: destination untouched.
        let (_, args) = build_command(&local_job("/data", "/backup"), false);
        assert_eq!(args.last().unwrap(), "/backup");
    }

    #[test]
    fn remote_ssh_injects_remote_shell_and_user_host_destination() {
        let mut job = local_job("/data", "/srv/backup");
        job.kind = DestinationKind::RemoteSsh {
            host: "backup.example.com".to_string(),
            user: "backup".to_string(),
            key_path: Some("/keys/id_backup".to_string()),
        };
        let (_, args) = build_command(&job, false);

        let e_pos = args.iter().position(|a| a == "-e").unwrap();
        assert_eq!(args[e_pos + 1], "ssh -i /keys/id_backup");
        // Remote shell comes after flags, before positional paths.
        assert_eq!(args[e_pos + 2], "/data");
        assert_eq!(args.last().unwrap(), "backup@backup.example.com:/srv/backup");
    }

    #[test]
    fn option_values_follow_their_flag() {
        let mut job = local_job("/data", "/backup");
        job.options
            .insert("--bwlimit".to_string(), "1000".to_string());
        let (_, args) = build_command(&job, false);
        let pos = args.iter().position(|a| a == "--bwlimit").unwrap();
        assert_eq!(args[pos + 1], "1000");
    }

    #[test]
    fn home_expansion_applies_only_to_leading_tilde() {
        assert_eq!(expand_home_with("~/docs", "/home/u"), "/home/u/docs");
        assert_eq!(expand_home_with("~", "/home/u"), "/home/u");
        assert_eq!(expand_home_with("~other/docs", "/home/u"), "~other/docs");
        assert_eq!(expand_home_with("/a/~/b", "/home/u"), "/a/~/b");
    }

    #[test]
    fn rsync_path_override_is_used() {
        let mut job = local_job("/data", "/backup");
        job.rsync_path = Some(PathBuf::from("/opt/rsync/bin/rsync"));
        let (program, _) = build_command(&job, false);
        assert_eq!(program, PathBuf::from("/opt/rsync/bin/rsync"));
    }
}
