//! Error types for promise cells.
//!
//! Errors raised by the core never escape as panics or `Err` returns from
//! public operations. Every failure surfaces as the rejection reason of some
//! cell, carried as [`Value::Error`](crate::Value::Error).
//!
//! # Error Kinds
//!
//! - **InitializerThrow**: the constructing initializer panicked
//! - **ChainCycle**: a cell would be resolved with itself
//! - **InvalidAggregateInput**: `all`/`all_settled` was handed a non-sequence
//! - **ContinuationThrow**: a `then`/`catch`/`finally` callback panicked
//! - **ThenableAccessThrow**: a foreign `then` member panicked while read or invoked
//! - **UnwrapDepthExceeded**: thenable unwrapping exceeded the configured depth
//!
//! A callback that *returns* `Err(reason)` rejects with `reason` itself; the
//! throw kinds above only wrap panics, which carry no user-chosen reason.

use core::fmt;
use std::any::Any;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The initializer passed to `Promise::new` panicked.
    InitializerThrow,
    /// A cell was resolved with itself.
    ChainCycle,
    /// A non-sequence value was passed to an aggregate combinator.
    InvalidAggregateInput,
    /// A continuation panicked.
    ContinuationThrow,
    /// Reading or invoking a foreign `then` member panicked.
    ThenableAccessThrow,
    /// Thenable unwrapping nested deeper than `PromiseConfig::max_unwrap_depth`.
    UnwrapDepthExceeded,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitializerThrow => "initializer_throw",
            Self::ChainCycle => "chain_cycle",
            Self::InvalidAggregateInput => "invalid_aggregate_input",
            Self::ContinuationThrow => "continuation_throw",
            Self::ThenableAccessThrow => "thenable_access_throw",
            Self::UnwrapDepthExceeded => "unwrap_depth_exceeded",
        }
    }

    /// Returns true if this kind records a caught panic in user code.
    #[must_use]
    pub const fn is_throw(&self) -> bool {
        matches!(
            self,
            Self::InitializerThrow | Self::ContinuationThrow | Self::ThenableAccessThrow
        )
    }

    const fn default_message(&self) -> &'static str {
        match self {
            Self::InitializerThrow => "initializer panicked",
            Self::ChainCycle => "chaining cycle detected for promise",
            Self::InvalidAggregateInput => "argument must be a sequence",
            Self::ContinuationThrow => "continuation panicked",
            Self::ThenableAccessThrow => "thenable `then` member panicked",
            Self::UnwrapDepthExceeded => "thenable unwrap depth exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type carried as a rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Adds a message to the error.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Builds a throw error from a caught panic payload.
    #[must_use]
    pub fn from_panic(kind: ErrorKind, payload: &(dyn Any + Send)) -> Self {
        Self::new(kind).with_message(panic_message(payload))
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the attached message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if this is a chain-cycle error.
    #[must_use]
    pub const fn is_chain_cycle(&self) -> bool {
        matches!(self.kind, ErrorKind::ChainCycle)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {msg}", self.kind),
            None => write!(f, "{}: {}", self.kind, self.kind.default_message()),
        }
    }
}

impl std::error::Error for Error {}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
