//! Core types for promise cells.
//!
//! - [`id`]: Opaque cell identifiers used for tracing
//! - [`outcome`]: Settlement states and terminal outcomes

pub mod id;
pub mod outcome;

pub use id::PromiseId;
pub use outcome::{PromiseState, Settled};
