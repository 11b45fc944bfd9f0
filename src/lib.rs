//! Pledge: single-threaded, single-assignment, chainable promise cells.
//!
//! # Overview
//!
//! A [`Promise`] is a cell that settles once, either fulfilled with a value
//! or rejected with a reason. Continuations attached with [`Promise::then`]
//! build new cells, so computations chain. Every continuation dispatch is
//! deferred through a scheduler injected via [`Cx`], never run inline.
//!
//! # Core Guarantees
//!
//! - **Single assignment**: the first settlement wins; later attempts are no-ops
//! - **Deferred dispatch**: a continuation never runs in the turn that attaches it
//! - **Attachment order**: continuations on one cell run in the order attached
//! - **No nested cells**: resolving with a cell or thenable adopts its outcome
//! - **No escaping failures**: panics in user code become rejections
//!
//! # Module Structure
//!
//! - [`promise`]: The cell, its state machine and the resolution procedure
//! - [`combinator`]: `all` and `all_settled`
//! - [`value`]: Dynamic values and the [`Thenable`] seam for foreign objects
//! - [`runtime`]: The [`Schedule`] trait and the FIFO [`MicrotaskQueue`]
//! - [`cx`]: Capability context carrying the scheduler and configuration
//! - [`lab`]: Deterministic host with virtual timers
//! - [`types`]: Identifiers, states and settlement descriptors
//! - [`config`]: Limits, environment overrides and TOML loading
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```
//! use pledge::{Cx, Promise, PromiseConfig, Settled, Value};
//!
//! let (cx, queue) = Cx::with_queue(PromiseConfig::default());
//! let p = Promise::resolve(&cx, 1)
//!     .then(|v| Ok(Value::from(v.as_int().unwrap_or(0) + 1)))
//!     .then(|v| Ok(Value::from(v.as_int().unwrap_or(0) + 1)));
//! queue.run_until_idle().unwrap();
//! assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from(3))));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod combinator;
pub mod config;
pub mod cx;
pub mod error;
pub mod lab;
pub mod promise;
pub mod runtime;
pub mod types;
pub mod value;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use config::{ConfigError, PromiseConfig};
pub use cx::Cx;
pub use error::{Error, ErrorKind};
pub use lab::{LabHost, LabReport};
pub use promise::{Handler, Promise, Resolvers};
pub use runtime::{DrainError, MicrotaskQueue, Schedule, Task};
pub use types::{PromiseId, PromiseState, Settled};
pub use value::{Completion, FnThenable, PlainObject, Thenable, Value};
