// src/exec/collector.rs

//! Concurrent draining of the child's stdout and stderr.
//!
//! One reader task per stream, both appending into a shared pair of
//! accumulator buffers behind a single mutex. The lock is held only for the
//! append itself; parsing happens outside it. Draining continuously keeps
//! the child from blocking on a full pipe buffer.
//!
//! [`StreamCollector::finish`] joins both reader tasks before handing the
//! buffers out, so finalization never races a still-appending reader.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::progress::ProgressParser;

/// Accumulated output of one run, complete once both readers have
/// observed end-of-stream.
#[derive(Debug, Default)]
pub struct OutputBuffers {
    pub stdout: String,
    pub stderr: String,
}

pub struct StreamCollector {
    buffers: Arc<Mutex<OutputBuffers>>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl StreamCollector {
    /// Spawn the two reader tasks. The parser is owned by the stdout
    /// reader; subscribe to its snapshots before calling this.
    pub fn spawn<O, E>(job_name: String, stdout: O, stderr: E, mut parser: ProgressParser) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let buffers = Arc::new(Mutex::new(OutputBuffers::default()));

        let stdout_task = {
            let buffers = Arc::clone(&buffers);
            let job_name = job_name.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();

                while let Ok(Some(line)) = lines.next_line().await {
                    trace!(job = %job_name, "stdout: {}", line);
                    {
                        let mut guard = buffers.lock().expect("output buffer lock poisoned");
                        guard.stdout.push_str(&line);
                        guard.stdout.push('\n');
                    }
                    // Outside the lock: a slow or malformed line must not
                    // stall the stderr reader.
                    parser.feed_line(&line);
                }

                debug!(job = %job_name, "stdout reader ended");
            })
        };

        let stderr_task = {
            let buffers = Arc::clone(&buffers);
            let job_name = job_name.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();

                while let Ok(Some(line)) = lines.next_line().await {
                    trace!(job = %job_name, "stderr: {}", line);
                    let mut guard = buffers.lock().expect("output buffer lock poisoned");
                    guard.stderr.push_str(&line);
                    guard.stderr.push('\n');
                }

                debug!(job = %job_name, "stderr reader ended");
            })
        };

        Self {
            buffers,
            stdout_task,
            stderr_task,
        }
    }

    /// Wait for both readers to observe end-of-stream, then take the
    /// accumulated buffers. After this no further appends can happen.
    pub async fn finish(self) -> OutputBuffers {
        let _ = self.stdout_task.await;
        let _ = self.stderr_task.await;

        let mut guard = self.buffers.lock().expect("output buffer lock poisoned");
        std::mem::take(&mut *guard)
    }
}
