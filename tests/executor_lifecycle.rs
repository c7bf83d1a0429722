mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use backsync::errors::SyncError;
use backsync::exec::JobExecutor;
use backsync::report::RunStatus;
use backsync_test_utils::builders::JobConfigBuilder;
use backsync_test_utils::fake_rsync;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn successful_run_finalizes_with_summary_counters() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let script = fake_rsync::write_script(dir.path(), "rsync-ok", fake_rsync::success_body());

    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dir.path().join("dest").to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    let result = with_timeout(executor.execute(&job, false)).await?;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.files_transferred, 2);
    assert_eq!(result.bytes_transferred, 3072);
    assert!(result.errors.is_empty());
    assert!(result.stdout.contains("photos/b.jpg"));
    assert!(result.finished_at >= result.started_at);
    Ok(())
}

#[tokio::test]
async fn progress_snapshots_are_observable_during_the_run() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let script = fake_rsync::write_script(dir.path(), "rsync-ok", fake_rsync::success_body());

    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dir.path().join("dest").to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    let mut rx = executor.subscribe();

    let result = with_timeout(executor.execute(&job, false)).await?;
    assert_eq!(result.status, RunStatus::Success);

    // The watch channel keeps the latest snapshot; by the end of the run
    // it must reflect the final progress line of the script.
    let s = rx.borrow_and_update().clone();
    assert_eq!(s.current_file, "photos/b.jpg");
    assert_eq!(s.files_total, 2);
    assert_eq!(s.files_completed, 2);
    assert_eq!(s.overall_percent, 100.0);
    Ok(())
}

#[tokio::test]
async fn partial_transfer_exit_is_partial_success_with_stderr_kept() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let script = fake_rsync::write_script(dir.path(), "rsync-23", fake_rsync::partial_body());

    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dir.path().join("dest").to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    let result = with_timeout(executor.execute(&job, false)).await?;

    assert_eq!(result.status, RunStatus::PartialSuccess);
    assert_eq!(result.files_transferred, 1);
    assert_eq!(result.bytes_transferred, 1024);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Permission denied"));
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_failed() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let script = fake_rsync::write_script(dir.path(), "rsync-fail", "exit 12");

    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dir.path().join("dest").to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    let result = with_timeout(executor.execute(&job, false)).await?;
    assert_eq!(result.status, RunStatus::Failed);
    Ok(())
}

#[tokio::test]
async fn missing_executable_fails_before_running() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dir.path().join("dest").to_str().unwrap())
        .rsync_path(dir.path().join("no-such-rsync"))
        .build();

    let executor = JobExecutor::new();
    let err = with_timeout(executor.execute(&job, false))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::ExecutionFailed(_)));
    assert!(!executor.is_running());
    Ok(())
}

#[tokio::test]
async fn dry_run_does_not_create_the_destination() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    // The script records its argv so we can check the built command too.
    let argv_file = dir.path().join("argv");
    let script = fake_rsync::write_script(
        dir.path(),
        "rsync-argv",
        &format!("echo \"$@\" > {}\nexit 0", argv_file.display()),
    );

    let dest = dir.path().join("never-created");
    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dest.to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    let result = with_timeout(executor.execute(&job, true)).await?;

    assert_eq!(result.status, RunStatus::Success);
    assert!(!dest.exists(), "dry run must not create the destination");

    let argv = std::fs::read_to_string(&argv_file)?;
    assert!(argv.contains("--dry-run"));
    Ok(())
}

#[tokio::test]
async fn destination_tree_is_created_for_real_runs() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let script = fake_rsync::write_script(dir.path(), "rsync-ok", fake_rsync::success_body());

    let dest = dir.path().join("deep/nested/dest");
    let job = JobConfigBuilder::new("photos")
        .source("/data/photos/")
        .destination(dest.to_str().unwrap())
        .rsync_path(&script)
        .build();

    let executor = JobExecutor::new();
    with_timeout(executor.execute(&job, false)).await?;
    assert!(dest.is_dir());
    Ok(())
}
