// src/progress/parser.rs

//! Incremental parsing of rsync's `--progress` output.
//!
//! rsync's progress format is informal and varies between versions, so the
//! parser is defensive by construction: any token it cannot extract leaves
//! the corresponding snapshot field unchanged, and no input line can make it
//! fail. Snapshots are published over a `watch` channel so emission never
//! blocks the stream reader that produced the line.

use regex::Regex;
use tokio::sync::watch;
use tracing::trace;

use super::ProgressSnapshot;

/// Lines longer than this are never filenames; rsync prints paths on their
/// own line, while pathological output (e.g. binary noise on stdout) can be
/// arbitrarily long.
const MAX_FILENAME_LINE_LEN: usize = 512;

/// Line prefixes that are tool status output, not filenames.
const STATUS_PREFIXES: &[&str] = &[
    "sending incremental file list",
    "building file list",
    "created directory",
    "receiving file list",
    "deleting ",
    "skipping ",
    "rsync:",
    "rsync error:",
    "cannot delete",
    "total size is",
    "total: ",
    "sent ",
    "Number of ",
    "Total ",
    "Literal data:",
    "Matched data:",
    "File list size:",
    "File list generation time:",
    "File list transfer time:",
];

pub struct ProgressParser {
    latest: ProgressSnapshot,
    tx: watch::Sender<ProgressSnapshot>,
    eta_re: Regex,
    to_check_re: Regex,
}

impl ProgressParser {
    /// Create a parser and the receiver observers subscribe through.
    ///
    /// Additional receivers can be obtained from [`ProgressParser::subscribe`].
    pub fn new() -> (Self, watch::Receiver<ProgressSnapshot>) {
        let (tx, rx) = watch::channel(ProgressSnapshot::default());
        (Self::with_sender(tx), rx)
    }

    /// Create a parser publishing into an existing channel, e.g. the
    /// executor's run-spanning progress channel.
    pub fn with_sender(tx: watch::Sender<ProgressSnapshot>) -> Self {
        Self {
            latest: ProgressSnapshot::default(),
            tx,
            // H:MM:SS or M:SS; rsync pads with zeros but we don't rely on it.
            eta_re: Regex::new(r"^(\d+):(\d{2})(?::(\d{2}))?$").unwrap(),
            to_check_re: Regex::new(r"to-check=(\d+)/(\d+)").unwrap(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Latest snapshot, regardless of whether anyone is subscribed.
    pub fn latest(&self) -> &ProgressSnapshot {
        &self.latest
    }

    /// Feed one stdout line. Emits a new snapshot when the line yielded
    /// any information; silently ignores everything else.
    pub fn feed_line(&mut self, line: &str) {
        let updated = if line.contains('%') {
            self.parse_percentage_line(line)
        } else {
            self.parse_filename_line(line)
        };

        if updated {
            trace!(snapshot = ?self.latest, "progress snapshot");
            // send_replace succeeds even with no live receivers;
            // fire-and-continue, the reader never waits on a consumer.
            self.tx.send_replace(self.latest.clone());
        }
    }

    /// A percentage line looks like:
    ///
    /// ```text
    ///   648 100%  2.55MB/s  00:00:00 (xfer#323, to-check=6988/42255)
    /// ```
    ///
    /// Tokenized on whitespace; each token kind is extracted independently
    /// and a token that fails to parse leaves its field unchanged.
    fn parse_percentage_line(&mut self, line: &str) -> bool {
        let mut next = self.latest.clone();
        let mut updated = false;

        for token in line.split_whitespace() {
            if let Some(percent) = token.strip_suffix('%') {
                if let Ok(p) = percent.parse::<f64>() {
                    if p.is_finite() {
                        next.file_percent = p.clamp(0.0, 100.0);
                        updated = true;
                    }
                }
            } else if let Some(speed) = parse_byte_rate(token) {
                next.speed_bytes_per_sec = speed;
                updated = true;
            } else if let Some(caps) = self.eta_re.captures(token) {
                let hours_or_mins: u64 = caps[1].parse().unwrap_or(0);
                let mid: u64 = caps[2].parse().unwrap_or(0);
                next.eta_secs = match caps.get(3) {
                    // H:MM:SS
                    Some(secs) => {
                        hours_or_mins * 3600 + mid * 60 + secs.as_str().parse().unwrap_or(0)
                    }
                    // M:SS
                    None => hours_or_mins * 60 + mid,
                };
                updated = true;
            } else if token.contains("to-check=") {
                if let Some(caps) = self.to_check_re.captures(token) {
                    let remaining: u64 = caps[1].parse().unwrap_or(0);
                    let total: u64 = caps[2].parse().unwrap_or(0);
                    next.files_total = total;
                    next.files_completed = total.saturating_sub(remaining);
                    if total > 0 {
                        next.overall_percent =
                            100.0 * next.files_completed as f64 / total as f64;
                    }
                    updated = true;
                }
            } else if let Ok(bytes) = token.replace(',', "").parse::<u64>() {
                // Leading plain number: bytes so far for the current file.
                next.bytes_transferred = bytes;
                updated = true;
            }
        }

        if updated {
            self.latest = next;
        }
        updated
    }

    /// A non-status, non-empty line of plausible length names the file
    /// currently being transferred. Everything else is ignored rather than
    /// misattributed.
    fn parse_filename_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.len() > MAX_FILENAME_LINE_LEN {
            return false;
        }
        if STATUS_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            return false;
        }

        // Only the filename changes; bytes/speed/percentages carry over.
        self.latest.current_file = trimmed.to_string();
        true
    }
}

/// Parse a byte-rate token (`2.55MB/s`) into bytes per second.
///
/// rsync uses binary (1024-based) multipliers for these units.
fn parse_byte_rate(token: &str) -> Option<f64> {
    const UNITS: &[(&str, f64)] = &[
        ("GB/s", 1024.0 * 1024.0 * 1024.0),
        ("MB/s", 1024.0 * 1024.0),
        ("KB/s", 1024.0),
        ("kB/s", 1024.0),
        ("B/s", 1.0),
    ];
    for (suffix, mult) in UNITS {
        if let Some(number) = token.strip_suffix(suffix) {
            let value: f64 = number.replace(',', "").parse().ok()?;
            if !value.is_finite() || value < 0.0 {
                return None;
            }
            return Some(value * mult);
        }
    }
    None
}
