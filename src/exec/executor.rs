// src/exec/executor.rs

//! Process controller for one sync job at a time.
//!
//! `JobExecutor` owns the whole lifecycle of a run: acquire scoped access,
//! build the command, spawn the child with piped stdio, drain both streams
//! concurrently, race process exit against cancellation, and finalize the
//! result from the complete buffers. One executor instance permits one
//! in-flight run; concurrent jobs need separate executors.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::process::Command;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::errors::{Result, SyncError};
use crate::exec::collector::StreamCollector;
use crate::exec::command::build_with_destination;
use crate::exec::scope::{self, FsScopedAccess, ScopedAccess};
use crate::progress::{ProgressParser, ProgressSnapshot};
use crate::report::{finalize, ExecutionResult, ExitDisposition};

pub struct JobExecutor {
    access: Arc<dyn ScopedAccess>,
    progress_tx: watch::Sender<ProgressSnapshot>,
    running: AtomicBool,
    cancel_requested: AtomicBool,
    cancel_notify: Notify,
}

/// Clears the single-flight flag on every exit path, panics included.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl JobExecutor {
    pub fn new() -> Self {
        Self::with_access(Arc::new(FsScopedAccess))
    }

    /// Use a custom scoped-access implementation (fakes in tests, a
    /// platform bookmark mechanism in a sandboxed build).
    pub fn with_access(access: Arc<dyn ScopedAccess>) -> Self {
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());
        Self {
            access,
            progress_tx,
            running: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        }
    }

    /// Observe live progress snapshots. The channel spans runs; each run
    /// starts publishing from a default snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request termination of the in-flight run. Idempotent; a no-op when
    /// nothing is running. The run still terminates through its normal
    /// path and still produces a (cancelled) result the caller must await.
    pub fn cancel(&self) {
        if !self.is_running() {
            debug!("cancel requested with no run in flight; ignoring");
            return;
        }
        info!("cancellation requested");
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_one();
    }

    /// Execute one run of `job`, suspending the caller until the process
    /// terminates and finalization completes.
    ///
    /// Fails with `AlreadyRunning` while another run is in flight on this
    /// instance, and with `AccessNotGranted` / `DestinationUnavailable` /
    /// `ExecutionFailed` before the process ever runs. Everything after a
    /// successful spawn is reported through the result's status instead.
    pub async fn execute(&self, job: &JobConfig, dry_run: bool) -> Result<ExecutionResult> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);
        self.cancel_requested.store(false, Ordering::SeqCst);

        // Grant released on drop, whatever path leaves this function.
        let grant = scope::acquire_for_job(&self.access, job)?;
        if !dry_run {
            scope::ensure_destination(job, grant.as_ref())?;
        }

        let destination = match &grant {
            Some(grant) => grant.path().to_string_lossy().into_owned(),
            None => job.destination.clone(),
        };
        let (program, args) = build_with_destination(job, &destination, dry_run);
        info!(job = %job.name, program = %program.display(), ?args, dry_run, "starting sync run");

        let started_at = Utc::now();
        self.progress_tx.send_replace(ProgressSnapshot::default());

        let mut child = Command::new(&program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SyncError::ExecutionFailed(format!(
                    "spawning '{}' for job '{}': {e}",
                    program.display(),
                    job.name
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SyncError::ExecutionFailed("child stdout pipe missing".to_string())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            SyncError::ExecutionFailed("child stderr pipe missing".to_string())
        })?;

        let parser = ProgressParser::with_sender(self.progress_tx.clone());
        let collector = StreamCollector::spawn(job.name.clone(), stdout, stderr, parser);

        // Race natural exit against cancellation. A notify permit left over
        // from a cancel that raced the previous run's end is filtered by
        // the cancel_requested flag.
        let disposition = loop {
            tokio::select! {
                status = child.wait() => {
                    let status = status.map_err(|e| {
                        SyncError::ExecutionFailed(format!(
                            "waiting for process of job '{}': {e}",
                            job.name
                        ))
                    })?;
                    info!(job = %job.name, code = ?status.code(), "process exited");
                    break match status.code() {
                        Some(code) => ExitDisposition::Exited(code),
                        None => ExitDisposition::Signalled,
                    };
                }
                _ = self.cancel_notify.notified() => {
                    if !self.cancel_requested.load(Ordering::SeqCst) {
                        continue;
                    }
                    info!(job = %job.name, "killing process on cancellation");
                    if let Err(e) = child.kill().await {
                        warn!(job = %job.name, error = %e, "failed to kill child process");
                    }
                    // Reap it; operator intent decides the status, not the
                    // exit code the kill produced.
                    let _ = child.wait().await;
                    break ExitDisposition::CancelRequested;
                }
            }
        };

        // Both readers must observe end-of-stream before the buffers are
        // read; finish() joins them.
        let buffers = collector.finish().await;

        Ok(finalize(
            &job.name,
            started_at,
            disposition,
            buffers.stdout,
            &buffers.stderr,
        ))
    }
}

impl Default for JobExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JobExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobExecutor")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
