// src/progress/mod.rs

pub mod parser;

use serde::Serialize;

pub use parser::ProgressParser;

/// One best-effort reconstruction of transfer progress, derived from the
/// tool's unstructured stdout. Immutable once emitted; each new line that
/// yields information produces a fresh snapshot carrying over every field
/// the line did not mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// File currently being transferred, as printed by the tool.
    pub current_file: String,
    pub files_completed: u64,
    pub files_total: u64,
    /// Bytes transferred so far for the current file.
    pub bytes_transferred: u64,
    pub bytes_total: u64,
    /// Percentage of the current file (0–100).
    pub file_percent: f64,
    /// Percentage of the whole run (0–100), derived from `to-check=` counters.
    pub overall_percent: f64,
    pub speed_bytes_per_sec: f64,
    /// Estimated time remaining, in seconds.
    pub eta_secs: u64,
}
