#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use pledge::{Completion, Cx, LabHost, MicrotaskQueue, Promise, PromiseConfig, Settled, Value};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::cell::RefCell;
use std::rc::Rc;

pub use pledge::test_utils::{init_test_logging, init_test_logging_with_level};

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

const PROPTEST_SEED_ENV: &str = "PLEDGE_PROPTEST_SEED";
const PROPTEST_MAX_SHRINK_ITERS_ENV: &str = "PLEDGE_PROPTEST_MAX_SHRINK_ITERS";

/// Configuration for property tests with optional deterministic seed support.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Fixed seed for reproducibility (overrides CI default when set).
    pub seed: Option<u64>,
    /// Number of successful cases required.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropertyTestConfig {
    /// Build a config with defaults for property tests.
    #[must_use]
    pub fn new(cases: u32) -> Self {
        Self {
            seed: read_proptest_seed(),
            cases,
            max_shrink_iters: read_max_shrink_iters()
                .unwrap_or(ProptestConfig::default().max_shrink_iters),
        }
    }

    /// Convert into a ProptestConfig, applying deterministic seed rules.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        let mut config = ProptestConfig::with_cases(self.cases);

        // Honor existing PROPTEST_RNG_SEED, otherwise apply our own.
        if matches!(config.rng_seed, RngSeed::Random) {
            if let Some(seed) = self.seed {
                config.rng_seed = RngSeed::Fixed(seed);
            }
        }

        config.max_shrink_iters = self.max_shrink_iters;
        config
    }
}

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    PropertyTestConfig::new(cases).to_proptest_config()
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }

    if std::env::var("CI").is_ok() {
        return Some(DEFAULT_PROPTEST_SEED);
    }

    None
}

fn read_max_shrink_iters() -> Option<u32> {
    std::env::var(PROPTEST_MAX_SHRINK_ITERS_ENV)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
}

/// Fresh context and queue with default limits.
#[must_use]
pub fn fresh_cx() -> (Cx, MicrotaskQueue) {
    Cx::with_queue(PromiseConfig::default())
}

/// Drain the queue, failing the test if the step limit trips.
pub fn drain(queue: &MicrotaskQueue) -> usize {
    queue.run_until_idle().expect("microtask drain failed")
}

/// Shared event log for ordering assertions.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// A continuation that records `tag:value` and passes the value on.
    pub fn recorder(&self, tag: &'static str) -> impl FnOnce(Value) -> Completion + 'static {
        let log = self.clone();
        move |v| {
            log.push(format!("{tag}:{v}"));
            Ok(v)
        }
    }
}

/// Integer payload of a value, for arithmetic continuations.
#[must_use]
pub fn int(v: &Value) -> i64 {
    v.as_int().expect("expected an int value")
}

/// Reason of a rejected cell.
#[must_use]
pub fn rejection(p: &Promise) -> Value {
    match p.outcome() {
        Some(Settled::Rejected(reason)) => reason,
        other => panic!("expected rejection, got {other:?}"),
    }
}

/// Value of a fulfilled cell.
#[must_use]
pub fn fulfillment(p: &Promise) -> Value {
    match p.outcome() {
        Some(Settled::Fulfilled(value)) => value,
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

/// A cell that fulfills with `value` after `delay_ms` of virtual time.
pub fn delayed_resolve(host: &LabHost, delay_ms: u64, value: impl Into<Value>) -> Promise {
    let (p, resolvers) = Promise::pending(host.cx());
    let value = value.into();
    host.set_timeout(std::time::Duration::from_millis(delay_ms), move || {
        resolvers.resolve(value);
    });
    p
}

/// A cell that rejects with `reason` after `delay_ms` of virtual time.
pub fn delayed_reject(host: &LabHost, delay_ms: u64, reason: impl Into<Value>) -> Promise {
    let (p, resolvers) = Promise::pending(host.cx());
    let reason = reason.into();
    host.set_timeout(std::time::Duration::from_millis(delay_ms), move || {
        resolvers.reject(reason);
    });
    p
}
