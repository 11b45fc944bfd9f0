//! Single-assignment promise cells.
//!
//! A [`Promise`] represents a value that is not known yet. Consumers attach
//! continuations with [`Promise::then`] and friends; each attachment returns a
//! new cell settled from the continuation's result.
//!
//! # Guarantees
//!
//! - A cell settles at most once; later settlement attempts are ignored.
//! - Continuations never run in the turn that attaches them or settles the
//!   cell. Every dispatch goes through the scheduler carried by the cell's
//!   [`Cx`].
//! - Continuations attached to one cell run in attachment order.
//! - A cell is never fulfilled with another cell: resolution adopts it.
//!
//! # Example
//!
//! ```
//! use pledge::{Cx, Promise, PromiseConfig, Settled, Value};
//!
//! let (cx, queue) = Cx::with_queue(PromiseConfig::default());
//! let p = Promise::new(&cx, |r| {
//!     r.reject("boom");
//!     Ok(())
//! })
//! .catch(Ok);
//! queue.run_until_idle().unwrap();
//! assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from("boom"))));
//! ```

mod resolve;
mod state;

pub use resolve::Resolvers;

use crate::cx::Cx;
use crate::error::{Error, ErrorKind};
use crate::types::{PromiseId, PromiseState, Settled};
use crate::value::{Completion, Value};
use resolve::resolve_value;
use state::{Reaction, State};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// A boxed continuation, as accepted by [`Promise::then_with`].
pub type Handler = Box<dyn FnOnce(Value) -> Completion>;

/// A single-assignment, chainable promise cell.
///
/// Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct Promise {
    inner: Rc<PromiseInner>,
}

struct PromiseInner {
    id: PromiseId,
    cx: Cx,
    state: RefCell<State>,
}

impl Promise {
    pub(crate) fn pending_cell(cx: &Cx) -> Self {
        let promise = Self {
            inner: Rc::new(PromiseInner {
                id: PromiseId::next(),
                cx: cx.clone(),
                state: RefCell::new(State::new()),
            }),
        };
        tracing::trace!(promise_id = %promise.id(), "promise created");
        promise
    }

    /// Creates a cell and runs `initializer` synchronously with its capabilities.
    ///
    /// If the initializer returns `Err(reason)` or panics before either
    /// capability is used, the cell is rejected (with `reason`, or with an
    /// `InitializerThrow` error for a panic).
    pub fn new<F>(cx: &Cx, initializer: F) -> Self
    where
        F: FnOnce(Resolvers) -> Result<(), Value>,
    {
        let promise = Self::pending_cell(cx);
        let resolvers = Resolvers::new(&promise, 0);
        let guard = resolvers.clone();
        match catch_unwind(AssertUnwindSafe(|| initializer(resolvers))) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => guard.reject(reason),
            Err(payload) => {
                tracing::warn!(promise_id = %promise.id(), "initializer panicked");
                guard.reject(Error::from_panic(
                    ErrorKind::InitializerThrow,
                    payload.as_ref(),
                ));
            }
        }
        promise
    }

    /// Creates a pending cell and hands back its capabilities.
    ///
    /// Useful when the settling side lives elsewhere, e.g. in a timer callback.
    #[must_use]
    pub fn pending(cx: &Cx) -> (Self, Resolvers) {
        let promise = Self::pending_cell(cx);
        let resolvers = Resolvers::new(&promise, 0);
        (promise, resolvers)
    }

    /// Returns a cell resolved with `value`.
    ///
    /// A `Value::Promise` is returned unchanged. Anything else goes through
    /// the resolution procedure, so thenables are unwrapped.
    pub fn resolve(cx: &Cx, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Promise(p) => p,
            other => {
                let promise = Self::pending_cell(cx);
                resolve_value(&promise, other, 0);
                promise
            }
        }
    }

    /// Returns a cell rejected with `reason`. The reason is never unwrapped.
    pub fn reject(cx: &Cx, reason: impl Into<Value>) -> Self {
        let promise = Self::pending_cell(cx);
        promise.settle(Settled::Rejected(reason.into()));
        promise
    }

    /// Returns this cell's identifier.
    #[must_use]
    pub fn id(&self) -> PromiseId {
        self.inner.id
    }

    /// Returns the context this cell dispatches through.
    #[must_use]
    pub fn cx(&self) -> &Cx {
        &self.inner.cx
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.inner.state.borrow().kind()
    }

    /// Returns the outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Settled> {
        self.inner.state.borrow().outcome()
    }

    /// Returns true if both handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attaches optional continuations and returns the derived cell.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` passes the reason through. A continuation's `Ok(x)`
    /// resolves the derived cell with `x`; `Err(r)` or a panic rejects it.
    pub fn then_with(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Self {
        let result = Self::pending_cell(self.cx());
        let fulfill = self.reaction(on_fulfilled, &result, true);
        let reject = self.reaction(on_rejected, &result, false);

        let ready = self.inner.state.borrow_mut().attach(fulfill, reject);
        match ready {
            // Already settled: the wrapper only schedules, so this stays deferred.
            Some((reaction, payload)) => reaction(payload),
            None => tracing::trace!(
                promise_id = %self.id(),
                derived = %result.id(),
                queue_len = self.inner.state.borrow().queued(),
                "continuation queued"
            ),
        }
        result
    }

    /// Attaches a fulfillment continuation; rejections pass through.
    pub fn then<F>(&self, on_fulfilled: F) -> Self
    where
        F: FnOnce(Value) -> Completion + 'static,
    {
        self.then_with(Some(Box::new(on_fulfilled)), None)
    }

    /// Attaches both a fulfillment and a rejection continuation.
    pub fn then_or<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Self
    where
        F: FnOnce(Value) -> Completion + 'static,
        R: FnOnce(Value) -> Completion + 'static,
    {
        self.then_with(Some(Box::new(on_fulfilled)), Some(Box::new(on_rejected)))
    }

    /// Attaches a rejection continuation; values pass through.
    pub fn catch<R>(&self, on_rejected: R) -> Self
    where
        R: FnOnce(Value) -> Completion + 'static,
    {
        self.then_with(None, Some(Box::new(on_rejected)))
    }

    /// Runs `on_finally` once the cell settles, whatever the outcome.
    ///
    /// The original value or reason passes through after `on_finally`'s own
    /// result has settled. If `on_finally` fails (returns `Err`, panics, or
    /// returns something that rejects), that failure replaces the outcome.
    pub fn finally<F>(&self, on_finally: F) -> Self
    where
        F: FnOnce() -> Completion + 'static,
    {
        let slot = Rc::new(Cell::new(Some(on_finally)));
        let reject_slot = Rc::clone(&slot);
        let cx = self.cx().clone();
        let reject_cx = cx.clone();

        self.then_with(
            Some(Box::new(move |value| {
                let settled = run_finally(&cx, &slot)?;
                Ok(settled.then(move |_| Ok(value)).into())
            })),
            Some(Box::new(move |reason| {
                let settled = run_finally(&reject_cx, &reject_slot)?;
                Ok(settled.then(move |_| Err(reason)).into())
            })),
        )
    }

    /// Settles the cell; returns false if it had already settled.
    pub(crate) fn settle(&self, outcome: Settled) -> bool {
        let state = outcome.status();
        let drained = self.inner.state.borrow_mut().settle(outcome);
        let Some((reactions, payload)) = drained else {
            tracing::trace!(promise_id = %self.id(), "settlement ignored: already settled");
            return false;
        };
        tracing::trace!(
            promise_id = %self.id(),
            state = %state,
            queue_len = reactions.len(),
            "promise settled"
        );
        for reaction in reactions {
            reaction(payload.clone());
        }
        true
    }

    /// Builds the queue wrapper that schedules `handler` against `result`.
    fn reaction(&self, handler: Option<Handler>, result: &Self, fulfilled: bool) -> Reaction {
        let cx = self.cx().clone();
        let result = result.clone();
        Box::new(move |payload| {
            cx.schedule(Box::new(move || run_handler(handler, payload, fulfilled, &result)));
        })
    }
}

/// Runs one continuation and settles its derived cell.
fn run_handler(handler: Option<Handler>, payload: Value, fulfilled: bool, result: &Promise) {
    let completion = match handler {
        Some(handler) => match catch_unwind(AssertUnwindSafe(move || handler(payload))) {
            Ok(completion) => completion,
            Err(panic) => {
                tracing::warn!(promise_id = %result.id(), "continuation panicked");
                Err(Error::from_panic(ErrorKind::ContinuationThrow, panic.as_ref()).into())
            }
        },
        None if fulfilled => Ok(payload),
        None => Err(payload),
    };
    match completion {
        Ok(x) => resolve_value(result, x, 0),
        Err(reason) => {
            result.settle(Settled::Rejected(reason));
        }
    }
}

/// Takes and runs the `finally` callback, wrapping its result in a cell.
fn run_finally<F>(cx: &Cx, slot: &Cell<Option<F>>) -> Result<Promise, Value>
where
    F: FnOnce() -> Completion,
{
    match slot.take() {
        Some(on_finally) => Ok(Promise::resolve(cx, on_finally()?)),
        None => Ok(Promise::resolve(cx, Value::Undefined)),
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Promise");
        dbg.field("id", &self.inner.id);
        match self.inner.state.try_borrow() {
            Ok(state) => dbg.field("state", &state.kind()),
            Err(_) => dbg.field("state", &"<settling>"),
        };
        dbg.finish()
    }
}
