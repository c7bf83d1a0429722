// src/exec/mod.rs

//! Process execution layer.
//!
//! This module turns a job snapshot into a running `rsync` child process
//! and supervises it until termination.
//!
//! - [`command`] builds the executable path and argument vector (pure).
//! - [`scope`] handles scoped destination access behind the
//!   `ScopedAccess` capability trait, with RAII release.
//! - [`collector`] drains stdout/stderr concurrently and feeds the
//!   progress parser.
//! - [`executor`] owns the run lifecycle: single-flight, spawn,
//!   cancellation, finalization.

pub mod collector;
pub mod command;
pub mod executor;
pub mod scope;

pub use collector::{OutputBuffers, StreamCollector};
pub use command::{build_command, DRY_RUN_FLAG};
pub use executor::JobExecutor;
pub use scope::{FsScopedAccess, ScopedAccess, ScopedGrant};
