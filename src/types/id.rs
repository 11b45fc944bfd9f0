//! Identifier types for promise cells.
//!
//! Identifiers exist only for tracing. They never influence settlement.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static PROMISE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// An opaque identifier assigned to each cell at construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(u64);

impl PromiseId {
    /// Allocates the next process-unique identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(PROMISE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an identifier with a fixed value for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PromiseId({})", self.0)
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = PromiseId::next();
        let b = PromiseId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn display_and_debug() {
        let id = PromiseId::new_for_test(7);
        assert_eq!(id.to_string(), "P7");
        assert_eq!(format!("{id:?}"), "PromiseId(7)");
        assert_eq!(id.as_u64(), 7);
    }
}
