//! Test utilities for Pledge.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Context and lab host constructors
//! - Settlement assertion macros
//!
//! # Example
//! ```
//! use pledge::test_utils::{init_test_logging, test_cx};
//! use pledge::Promise;
//!
//! init_test_logging();
//! let (cx, queue) = test_cx();
//! let p = Promise::resolve(&cx, 1).then(Ok);
//! queue.run_until_idle().unwrap();
//! pledge::assert_fulfilled!(p, pledge::Value::from(1));
//! ```

use crate::config::PromiseConfig;
use crate::cx::Cx;
use crate::lab::LabHost;
use crate::runtime::MicrotaskQueue;
use std::sync::{Mutex, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Create a context backed by a fresh microtask queue, with default limits.
#[must_use]
pub fn test_cx() -> (Cx, MicrotaskQueue) {
    Cx::with_queue(PromiseConfig::default())
}

/// Create a lab host with default limits.
#[must_use]
pub fn test_host() -> LabHost {
    LabHost::new(PromiseConfig::default())
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that a promise is fulfilled with a specific value.
#[macro_export]
macro_rules! assert_fulfilled {
    ($promise:expr, $expected:expr) => {
        match $promise.outcome() {
            Some($crate::types::Settled::Fulfilled(v)) => assert_eq!(v, $expected),
            other => unreachable!("expected fulfilled with {:?}, got {:?}", $expected, other),
        }
    };
}

/// Assert that a promise is rejected, optionally with a specific reason.
#[macro_export]
macro_rules! assert_rejected {
    ($promise:expr) => {
        match $promise.outcome() {
            Some($crate::types::Settled::Rejected(_)) => {}
            other => unreachable!("expected rejected, got {:?}", other),
        }
    };
    ($promise:expr, $expected:expr) => {
        match $promise.outcome() {
            Some($crate::types::Settled::Rejected(r)) => assert_eq!(r, $expected),
            other => unreachable!("expected rejected with {:?}, got {:?}", $expected, other),
        }
    };
}
