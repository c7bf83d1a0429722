// src/report/mod.rs

pub mod finalize;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use finalize::{finalize, ExitDisposition, PARTIAL_TRANSFER_EXIT};

/// Terminal status of one run.
///
/// Callers branch on this, never on error-list emptiness: a run with
/// warnings on stderr is still `Success`, and a partial transfer is a
/// first-class outcome rather than a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// The tool's "partial transfer" exit: some files made it, some didn't.
    PartialSuccess,
    Failed,
    /// Operator-requested termination; wins over whatever exit code the
    /// kill produced.
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial success",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The frozen record of one run. Assembled exactly once by
/// [`finalize`] after both stream readers have finished; never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub files_transferred: u64,
    pub bytes_transferred: u64,
    /// Captured stderr plus any engine-level notes. Retained on every
    /// status; it is the only diagnostic surface for the wrapped tool.
    pub errors: Vec<String>,
    /// Complete captured stdout text.
    pub stdout: String,
}
