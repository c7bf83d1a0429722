// src/exec/scope.rs

//! Scoped destination access.
//!
//! Sandbox-gated destinations (cloud-drive folders and the like) are only
//! reachable through a previously obtained access token. The mechanism is
//! platform-specific, so it sits behind the `ScopedAccess` capability trait:
//! production code uses [`FsScopedAccess`], tests use a fake that records
//! acquire/release pairs without any real sandbox.
//!
//! Release is guaranteed on every exit path: the grant is an RAII guard
//! that releases on `Drop`, so success, error, cancellation and panic all
//! end with the grant released.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{DestinationKind, JobConfig};
use crate::errors::{Result, SyncError};
use crate::exec::command::expand_home;

/// Capability interface for scoped destination access.
pub trait ScopedAccess: Send + Sync + Debug {
    /// Resolve an access token to a concrete destination path and start
    /// the access grant. Fails with `DestinationUnavailable` when the
    /// token no longer resolves.
    fn acquire(&self, token: &str) -> Result<PathBuf>;

    /// Stop the access grant. Called exactly once per successful acquire,
    /// from the grant's `Drop`.
    fn release(&self, path: &Path);
}

/// A live access grant, released on drop.
#[derive(Debug)]
pub struct ScopedGrant {
    path: PathBuf,
    access: Arc<dyn ScopedAccess>,
}

impl ScopedGrant {
    /// The concrete destination path the token resolved to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedGrant {
    fn drop(&mut self) {
        self.access.release(&self.path);
    }
}

/// Acquire whatever grant the job's destination kind requires.
///
/// Returns `Ok(None)` for kinds that need no grant. A scoped destination
/// without a token fails with `AccessNotGranted`: the grant is obtained
/// out-of-band (folder selection in the frontend), never here.
pub fn acquire_for_job(
    access: &Arc<dyn ScopedAccess>,
    job: &JobConfig,
) -> Result<Option<ScopedGrant>> {
    match &job.kind {
        DestinationKind::ScopedCloudFolder { bookmark } => {
            let token = bookmark.as_deref().ok_or(SyncError::AccessNotGranted)?;
            let path = access.acquire(token)?;
            debug!(job = %job.name, path = %path.display(), "scoped access acquired");
            Ok(Some(ScopedGrant {
                path,
                access: Arc::clone(access),
            }))
        }
        DestinationKind::Local | DestinationKind::RemoteSsh { .. } => Ok(None),
    }
}

/// Create the destination directory tree before the first run into a
/// not-yet-existing destination. Skipped entirely for dry runs and for
/// remote destinations (the remote side handles its own tree).
pub fn ensure_destination(job: &JobConfig, grant: Option<&ScopedGrant>) -> Result<()> {
    let dest = match (&job.kind, grant) {
        (DestinationKind::RemoteSsh { .. }, _) => return Ok(()),
        // The grant already proved the scoped root accessible; only the
        // subtree below it may be missing.
        (DestinationKind::ScopedCloudFolder { .. }, Some(grant)) => grant.path().to_path_buf(),
        (DestinationKind::ScopedCloudFolder { .. }, None) => {
            return Err(SyncError::AccessNotGranted)
        }
        (DestinationKind::Local, _) => PathBuf::from(expand_home(&job.destination)),
    };

    if !dest.exists() {
        debug!(job = %job.name, dest = %dest.display(), "creating destination directory tree");
        fs::create_dir_all(&dest)?;
    }
    Ok(())
}

/// Production `ScopedAccess`: tokens are filesystem paths.
///
/// The macOS security-scoped bookmark variant implements the same trait;
/// the engine's contract (acquire before spawn, release on every exit
/// path) does not change with the mechanism.
#[derive(Debug, Clone, Default)]
pub struct FsScopedAccess;

impl ScopedAccess for FsScopedAccess {
    fn acquire(&self, token: &str) -> Result<PathBuf> {
        let path = PathBuf::from(expand_home(token));
        if !path.exists() {
            return Err(SyncError::DestinationUnavailable(format!(
                "scoped destination '{}' does not resolve",
                path.display()
            )));
        }
        path.canonicalize().map_err(|e| {
            SyncError::DestinationUnavailable(format!(
                "scoped destination '{}' is not accessible: {e}",
                path.display()
            ))
        })
    }

    fn release(&self, path: &Path) {
        debug!(path = %path.display(), "scoped access released");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn scoped_job(bookmark: Option<String>) -> JobConfig {
        JobConfig {
            name: "scoped".to_string(),
            sources: vec!["/data/".to_string()],
            destination: "cloud".to_string(),
            kind: DestinationKind::ScopedCloudFolder { bookmark },
            options: BTreeMap::new(),
            rsync_path: None,
        }
    }

    #[test]
    fn missing_token_is_access_not_granted() {
        let access: Arc<dyn ScopedAccess> = Arc::new(FsScopedAccess);
        let err = acquire_for_job(&access, &scoped_job(None)).unwrap_err();
        assert!(matches!(err, SyncError::AccessNotGranted));
    }

    #[test]
    fn unresolvable_token_is_destination_unavailable() {
        let access: Arc<dyn ScopedAccess> = Arc::new(FsScopedAccess);
        let job = scoped_job(Some("/definitely/not/a/real/mount".to_string()));
        let err = acquire_for_job(&access, &job).unwrap_err();
        assert!(matches!(err, SyncError::DestinationUnavailable(_)));
    }

    #[test]
    fn resolvable_token_yields_grant_with_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let access: Arc<dyn ScopedAccess> = Arc::new(FsScopedAccess);
        let job = scoped_job(Some(dir.path().to_string_lossy().into_owned()));

        let grant = acquire_for_job(&access, &job).unwrap().unwrap();
        assert_eq!(grant.path(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn local_destination_tree_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b/c");
        let mut job = scoped_job(None);
        job.kind = DestinationKind::Local;
        job.destination = dest.to_string_lossy().into_owned();

        ensure_destination(&job, None).unwrap();
        assert!(dest.is_dir());
    }

    #[test]
    fn remote_destination_needs_no_local_tree() {
        let mut job = scoped_job(None);
        job.kind = DestinationKind::RemoteSsh {
            host: "h".to_string(),
            user: "u".to_string(),
            key_path: None,
        };
        job.destination = "/definitely/not/created/locally".to_string();
        ensure_destination(&job, None).unwrap();
        assert!(!Path::new("/definitely/not/created/locally").exists());
    }
}
