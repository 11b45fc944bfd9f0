//! The per-cell settlement state machine.
//!
//! ```text
//!            settle(Fulfilled(v))
//!   Pending ───────────────────────► Fulfilled(v)
//!      │
//!      │     settle(Rejected(r))
//!      └───────────────────────────► Rejected(r)
//! ```
//!
//! Settling consumes the `Pending` variant, and with it both reaction queues.
//! A terminal state has nowhere to store reactions, so late attachments are
//! dispatched at once instead of queued.

use crate::types::{PromiseState, Settled};
use crate::value::Value;
use smallvec::SmallVec;
use std::mem;

/// A queued wrapper, invoked with the outcome once the cell settles.
///
/// Wrappers only schedule; they never run a continuation directly.
pub(crate) type Reaction = Box<dyn FnOnce(Value)>;

/// Reactions attached while pending, in attachment order.
pub(crate) type Reactions = SmallVec<[Reaction; 2]>;

pub(crate) enum State {
    Pending {
        on_fulfilled: Reactions,
        on_rejected: Reactions,
    },
    Fulfilled(Value),
    Rejected(Value),
}

impl State {
    pub(crate) fn new() -> Self {
        Self::Pending {
            on_fulfilled: SmallVec::new(),
            on_rejected: SmallVec::new(),
        }
    }

    pub(crate) const fn kind(&self) -> PromiseState {
        match self {
            Self::Pending { .. } => PromiseState::Pending,
            Self::Fulfilled(_) => PromiseState::Fulfilled,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }

    pub(crate) fn outcome(&self) -> Option<Settled> {
        match self {
            Self::Pending { .. } => None,
            Self::Fulfilled(v) => Some(Settled::Fulfilled(v.clone())),
            Self::Rejected(r) => Some(Settled::Rejected(r.clone())),
        }
    }

    pub(crate) fn queued(&self) -> usize {
        match self {
            Self::Pending { on_fulfilled, .. } => on_fulfilled.len(),
            _ => 0,
        }
    }

    /// Moves to the terminal state for `outcome`.
    ///
    /// Returns the reactions to dispatch and the outcome payload, or `None`
    /// if the cell had already settled.
    pub(crate) fn settle(&mut self, outcome: Settled) -> Option<(Reactions, Value)> {
        if !matches!(self, Self::Pending { .. }) {
            return None;
        }
        let (terminal, payload, fulfilled) = match outcome {
            Settled::Fulfilled(v) => (Self::Fulfilled(v.clone()), v, true),
            Settled::Rejected(r) => (Self::Rejected(r.clone()), r, false),
        };
        let Self::Pending {
            on_fulfilled,
            on_rejected,
        } = mem::replace(self, terminal)
        else {
            return None;
        };
        let reactions = if fulfilled { on_fulfilled } else { on_rejected };
        Some((reactions, payload))
    }

    /// Attaches a reaction pair.
    ///
    /// While pending both are queued. Once settled, the matching reaction is
    /// handed back with the outcome payload for immediate dispatch.
    pub(crate) fn attach(
        &mut self,
        fulfill: Reaction,
        reject: Reaction,
    ) -> Option<(Reaction, Value)> {
        match self {
            Self::Pending {
                on_fulfilled,
                on_rejected,
            } => {
                on_fulfilled.push(fulfill);
                on_rejected.push(reject);
                None
            }
            Self::Fulfilled(v) => Some((fulfill, v.clone())),
            Self::Rejected(r) => Some((reject, r.clone())),
        }
    }
}
