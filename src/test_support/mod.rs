//! Test support infrastructure.
//!
//! This module and its contents are only compiled when running tests. It is
//! excluded from release builds.
//!
//! **BOUNDARY INVARIANT**: No code in this module should be referenced by runtime code.
//! All items here exist solely to support testing.

#![cfg(test)]

mod harness;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

pub use harness::{write_exec, FakeRunner};
pub use logs::capture_logs;

/// Serializes tests that read or mutate process environment variables.
pub static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
