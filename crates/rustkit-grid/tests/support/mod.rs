//! Test support utilities for RustKit Grid integration tests
//!
//! - ContentSizer: host sizer with fixed per-item content sizes
//! - Assertions: track and placement assertions

#![allow(dead_code)]

mod assertions;
mod sizer;

pub use assertions::*;
pub use sizer::{ContentSizer, ItemContent};

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
