//! Settlement states and outcomes.
//!
//! A cell is in exactly one [`PromiseState`]. Once it leaves `Pending` the
//! state and its [`Settled`] outcome never change again.

use crate::value::Value;
use core::fmt;

/// The observable state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a reason.
    Rejected,
}

impl PromiseState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns a lowercase name, as used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal outcome: the fulfillment value or the rejection reason.
///
/// Also used as the per-input descriptor produced by `all_settled`.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// Fulfilled with a value.
    Fulfilled(Value),
    /// Rejected with a reason.
    Rejected(Value),
}

impl Settled {
    /// Returns the state this outcome corresponds to.
    #[must_use]
    pub const fn status(&self) -> PromiseState {
        match self {
            Self::Fulfilled(_) => PromiseState::Fulfilled,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// Returns true if this outcome is `Fulfilled`.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if this outcome is `Rejected`.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the fulfillment value, if fulfilled.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Fulfilled(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the rejection reason, if rejected.
    #[must_use]
    pub const fn reason(&self) -> Option<&Value> {
        match self {
            Self::Fulfilled(_) => None,
            Self::Rejected(r) => Some(r),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Self::Fulfilled(v) => Ok(v),
            Self::Rejected(r) => Err(r),
        }
    }
}

impl From<Result<Value, Value>> for Settled {
    fn from(result: Result<Value, Value>) -> Self {
        match result {
            Ok(v) => Self::Fulfilled(v),
            Err(r) => Self::Rejected(r),
        }
    }
}

impl fmt::Display for Settled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fulfilled(v) => write!(f, "{{status: fulfilled, value: {v}}}"),
            Self::Rejected(r) => write!(f, "{{status: rejected, reason: {r}}}"),
        }
    }
}
