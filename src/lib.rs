// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod progress;
pub mod report;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::exec::JobExecutor;
use crate::report::ExecutionResult;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading + selection
/// - the executor
/// - a progress printer task
/// - Ctrl-C → cancellation
pub async fn run(args: CliArgs) -> Result<()> {
    let file = load_and_validate(&args.config)?;
    let job = file.select(args.job.as_deref())?.clone();

    let executor = Arc::new(JobExecutor::new());

    // Print live snapshots as they arrive. The watch channel only keeps
    // the latest value, so a slow terminal never backs up the readers.
    {
        let mut rx = executor.subscribe();
        let job_name = job.name.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let s = rx.borrow_and_update().clone();
                info!(
                    job = %job_name,
                    file = %s.current_file,
                    overall = format!("{:.1}%", s.overall_percent),
                    speed = format!("{:.0} B/s", s.speed_bytes_per_sec),
                    eta_secs = s.eta_secs,
                    "progress"
                );
            }
        });
    }

    // Ctrl-C cancels the run; the executor still produces a result.
    {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            executor.cancel();
        });
    }

    let result = executor.execute(&job, args.dry_run).await?;
    print_result(&result);
    Ok(())
}

fn print_result(result: &ExecutionResult) {
    println!("job '{}' finished: {}", result.job_name, result.status);
    println!("  files transferred: {}", result.files_transferred);
    println!("  bytes transferred: {}", result.bytes_transferred);
    println!(
        "  duration: {}s",
        (result.finished_at - result.started_at).num_seconds()
    );
    for err in result.errors.iter() {
        println!("  stderr: {err}");
    }
}
