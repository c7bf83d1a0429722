// src/report/finalize.rs

//! Single-shot result finalization.
//!
//! Runs once per execution, after both stream readers have observed
//! end-of-stream, over the complete captured output. Extraction is
//! best-effort: some failure modes produce no summary block at all, in
//! which case the counters default to zero.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{ExecutionResult, RunStatus};

/// rsync's well-known "partial transfer" exit code.
pub const PARTIAL_TRANSFER_EXIT: i32 = 23;

/// How the run ended, as seen by the process controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// The process exited on its own with a code.
    Exited(i32),
    /// The process was terminated by a signal and produced no exit code.
    Signalled,
    /// The controller's own `cancel()` terminated the run. Overrides
    /// whatever exit the kill happened to produce.
    CancelRequested,
}

/// Assemble the frozen `ExecutionResult` for one run.
///
/// This is the single mutation point for the result entity; the same
/// buffers and exit disposition always produce the same record, modulo
/// `id` and timestamps.
pub fn finalize(
    job_name: &str,
    started_at: DateTime<Utc>,
    exit: ExitDisposition,
    stdout: String,
    stderr: &str,
) -> ExecutionResult {
    let status = match exit {
        ExitDisposition::CancelRequested => RunStatus::Cancelled,
        ExitDisposition::Exited(0) => RunStatus::Success,
        ExitDisposition::Exited(PARTIAL_TRANSFER_EXIT) => RunStatus::PartialSuccess,
        ExitDisposition::Exited(_) | ExitDisposition::Signalled => RunStatus::Failed,
    };

    let files_transferred = labeled_count(&stdout, "files transferred:").unwrap_or(0);
    let bytes_transferred = labeled_count(&stdout, "Total transferred file size:").unwrap_or(0);

    // stderr is kept on every status; permission warnings on individual
    // files show up there even on a nominal success.
    let mut errors = Vec::new();
    if !stderr.trim().is_empty() {
        errors.push(stderr.trim_end().to_string());
    }

    debug!(
        job = %job_name,
        ?exit,
        %status,
        files_transferred,
        bytes_transferred,
        "run finalized"
    );

    ExecutionResult {
        id: Uuid::new_v4(),
        job_name: job_name.to_string(),
        started_at,
        finished_at: Utc::now(),
        status,
        files_transferred,
        bytes_transferred,
        errors,
        stdout,
    }
}

/// Extract the first number following `label` on any line of `text`.
///
/// Matches the tool's labeled-colon summary format, e.g.
/// `Number of files transferred: 42` or
/// `Total transferred file size: 1,234,567 bytes`.
/// Comma grouping is accepted; anything after the number is ignored.
fn labeled_count(text: &str, label: &str) -> Option<u64> {
    for line in text.lines() {
        let Some(pos) = line.find(label) else {
            continue;
        };
        let rest = line[pos + label.len()..].trim_start();
        let digits: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == ',')
            .filter(|c| c.is_ascii_digit())
            .collect();
        if let Ok(n) = digits.parse::<u64>() {
            return Some(n);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "\
sending incremental file list
photos/a.jpg

Number of files: 50
Number of files transferred: 42
Total file size: 9,876,543 bytes
Total transferred file size: 1,234,567 bytes

sent 1,240,000 bytes  received 1,500 bytes  12,345.00 bytes/sec
total size is 9,876,543  speedup is 7.95
";

    #[test]
    fn extracts_summary_counters() {
        let r = finalize("job", Utc::now(), ExitDisposition::Exited(0), SUMMARY.to_string(), "");
        assert_eq!(r.files_transferred, 42);
        assert_eq!(r.bytes_transferred, 1_234_567);
        assert_eq!(r.status, RunStatus::Success);
        assert!(r.errors.is_empty());
    }

    #[test]
    fn rsync3_regular_files_label_also_matches() {
        let text = "Number of regular files transferred: 1,024\n";
        let r = finalize("job", Utc::now(), ExitDisposition::Exited(0), text.to_string(), "");
        assert_eq!(r.files_transferred, 1024);
    }

    #[test]
    fn missing_summary_defaults_to_zero() {
        let r = finalize(
            "job",
            Utc::now(),
            ExitDisposition::Exited(1),
            "rsync: connection unexpectedly closed\n".to_string(),
            "",
        );
        assert_eq!(r.files_transferred, 0);
        assert_eq!(r.bytes_transferred, 0);
        assert_eq!(r.status, RunStatus::Failed);
    }

    #[test]
    fn exit_code_23_is_partial_success_even_with_stderr() {
        let r = finalize(
            "job",
            Utc::now(),
            ExitDisposition::Exited(23),
            String::new(),
            "rsync: send_files failed to open \"/locked\": Permission denied (13)\n",
        );
        assert_eq!(r.status, RunStatus::PartialSuccess);
        assert_eq!(r.errors.len(), 1);
    }

    #[test]
    fn stderr_never_downgrades_success() {
        let r = finalize(
            "job",
            Utc::now(),
            ExitDisposition::Exited(0),
            SUMMARY.to_string(),
            "rsync: some permission warning\n",
        );
        assert_eq!(r.status, RunStatus::Success);
        assert_eq!(r.errors, vec!["rsync: some permission warning"]);
    }

    #[test]
    fn cancel_wins_over_exit_code() {
        let r = finalize(
            "job",
            Utc::now(),
            ExitDisposition::CancelRequested,
            String::new(),
            "",
        );
        assert_eq!(r.status, RunStatus::Cancelled);
    }

    #[test]
    fn signal_termination_without_cancel_is_failed() {
        let r = finalize("job", Utc::now(), ExitDisposition::Signalled, String::new(), "");
        assert_eq!(r.status, RunStatus::Failed);
    }

    #[test]
    fn finalization_is_deterministic_modulo_id_and_timestamps() {
        let started = Utc::now();
        let a = finalize("job", started, ExitDisposition::Exited(23), SUMMARY.to_string(), "boom");
        let b = finalize("job", started, ExitDisposition::Exited(23), SUMMARY.to_string(), "boom");
        assert_eq!(a.status, b.status);
        assert_eq!(a.files_transferred, b.files_transferred);
        assert_eq!(a.bytes_transferred, b.bytes_transferred);
        assert_eq!(a.errors, b.errors);
        assert_eq!(a.stdout, b.stdout);
        assert_ne!(a.id, b.id);
    }
}
