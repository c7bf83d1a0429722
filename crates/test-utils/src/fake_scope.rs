//! Fake `ScopedAccess` implementation with no real sandbox.
//!
//! Records every acquire/release pair so tests can assert the guaranteed-
//! release contract, and can be configured to fail resolution.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use backsync::errors::{Result, SyncError};
use backsync::exec::ScopedAccess;

#[derive(Debug)]
pub struct FakeScopedAccess {
    /// Path every token resolves to; `None` simulates a stale bookmark.
    resolve_to: Option<PathBuf>,
    pub acquired: Mutex<Vec<String>>,
    pub released: Mutex<Vec<PathBuf>>,
}

impl FakeScopedAccess {
    /// Every token resolves to `path`.
    pub fn resolving_to(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            resolve_to: Some(path.into()),
            acquired: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        })
    }

    /// Every acquisition fails with `DestinationUnavailable`.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            resolve_to: None,
            acquired: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        })
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.lock().unwrap().len()
    }

    pub fn release_count(&self) -> usize {
        self.released.lock().unwrap().len()
    }
}

impl ScopedAccess for FakeScopedAccess {
    fn acquire(&self, token: &str) -> Result<PathBuf> {
        match &self.resolve_to {
            Some(path) => {
                self.acquired.lock().unwrap().push(token.to_string());
                Ok(path.clone())
            }
            None => Err(SyncError::DestinationUnavailable(format!(
                "fake bookmark '{token}' no longer resolves"
            ))),
        }
    }

    fn release(&self, path: &Path) {
        self.released.lock().unwrap().push(path.to_path_buf());
    }
}
