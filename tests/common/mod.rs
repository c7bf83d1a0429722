#![allow(dead_code)]

pub use backsync_test_utils::{init_tracing, with_timeout};
