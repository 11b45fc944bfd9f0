//! The resolution procedure and the single-use resolving capabilities.
//!
//! `resolve_value(target, x)` decides what a resolution attempt means:
//!
//! 1. `x` is `target` itself: reject with `ChainCycle`.
//! 2. `x` is a promise or a foreign object with a callable `then`: invoke it
//!    with a fresh [`Resolvers`] pair and let it settle `target` later.
//! 3. Reading a foreign `then` fails: reject with the failure reason.
//! 4. Anything else: fulfill with `x`.
//!
//! Step 2 recurses through the resolve capability, so chains of thenables
//! unwrap until a plain value or a rejection is reached. Only direct
//! self-reference is detected. Longer cycles are bounded only when
//! `PromiseConfig::max_unwrap_depth` is set. Once the limit is reached a
//! promise or object value is rejected before its `then` is read.
//!
//! Two pending cells that adopt each other each hold the other's resolvers
//! in their reaction queue. The pair forms an `Rc` cycle: it never settles
//! and is never freed.

use super::Promise;
use crate::error::{Error, ErrorKind};
use crate::types::Settled;
use crate::value::{ThenHook, Value};
use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// A single-use completion token.
///
/// The target cell can only be reached by taking it out of the token, so a
/// second take finds nothing and the call is a no-op by construction.
struct CompletionToken {
    target: Cell<Option<Promise>>,
    depth: usize,
}

impl CompletionToken {
    fn consume(&self) -> Option<Promise> {
        self.target.take()
    }

    fn is_consumed(&self) -> bool {
        let target = self.target.take();
        let consumed = target.is_none();
        self.target.set(target);
        consumed
    }
}

/// The resolve/reject capability pair bound to one resolution attempt.
///
/// Both halves share one [`CompletionToken`]: only the first call across
/// `resolve` and `reject` (and across all clones) has any effect.
#[derive(Clone)]
pub struct Resolvers {
    token: Rc<CompletionToken>,
}

impl Resolvers {
    pub(crate) fn new(target: &Promise, depth: usize) -> Self {
        Self {
            token: Rc::new(CompletionToken {
                target: Cell::new(Some(target.clone())),
                depth,
            }),
        }
    }

    /// Resolves the target with `value`, unwrapping promises and thenables.
    pub fn resolve(&self, value: impl Into<Value>) {
        if let Some(target) = self.token.consume() {
            resolve_value(&target, value.into(), self.token.depth);
        } else {
            tracing::trace!("resolve ignored: capability already used");
        }
    }

    /// Rejects the target with `reason`. The reason is never unwrapped.
    pub fn reject(&self, reason: impl Into<Value>) {
        if let Some(target) = self.token.consume() {
            target.settle(Settled::Rejected(reason.into()));
        } else {
            tracing::trace!("reject ignored: capability already used");
        }
    }

    /// Returns true once either capability has been used.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.token.is_consumed()
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("consumed", &self.is_consumed())
            .field("depth", &self.token.depth)
            .finish()
    }
}

/// How a resolution value exposes `then`.
enum ThenSource {
    Native(Promise),
    Foreign(ThenHook),
}

/// Runs the resolution procedure for `x` against `target`.
pub(crate) fn resolve_value(target: &Promise, x: Value, depth: usize) {
    if let Value::Promise(p) = &x {
        if p.ptr_eq(target) {
            tracing::warn!(promise_id = %target.id(), "promise resolved with itself");
            target.settle(Settled::Rejected(Error::new(ErrorKind::ChainCycle).into()));
            return;
        }
    }

    if matches!(x, Value::Promise(_) | Value::Object(_)) {
        if let Some(limit) = target.cx().config().max_unwrap_depth {
            if depth >= limit {
                tracing::warn!(promise_id = %target.id(), depth, limit, "adoption depth exceeded");
                let err = Error::new(ErrorKind::UnwrapDepthExceeded)
                    .with_message(format!("gave up after {depth} nested adoptions"));
                target.settle(Settled::Rejected(err.into()));
                return;
            }
        }
    }

    let source = match then_source(&x) {
        Ok(Some(source)) => source,
        Ok(None) => {
            target.settle(Settled::Fulfilled(x));
            return;
        }
        Err(reason) => {
            target.settle(Settled::Rejected(reason));
            return;
        }
    };

    let resolvers = Resolvers::new(target, depth + 1);
    match source {
        ThenSource::Native(other) => {
            tracing::debug!(promise_id = %target.id(), adopted = %other.id(), "adopting promise");
            adopt(&other, resolvers);
        }
        ThenSource::Foreign(hook) => {
            tracing::debug!(promise_id = %target.id(), depth, "invoking foreign then");
            let guard = resolvers.clone();
            match catch_unwind(AssertUnwindSafe(|| hook(resolvers))) {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => guard.reject(reason),
                Err(payload) => {
                    tracing::warn!(promise_id = %target.id(), "foreign then panicked");
                    guard.reject(Error::from_panic(ErrorKind::ThenableAccessThrow, payload.as_ref()));
                }
            }
        }
    }
}

/// Reads the `then` member of `x`, if it has a callable one.
fn then_source(x: &Value) -> Result<Option<ThenSource>, Value> {
    match x {
        Value::Promise(p) => Ok(Some(ThenSource::Native(p.clone()))),
        Value::Object(obj) => match catch_unwind(AssertUnwindSafe(|| obj.then_member())) {
            Ok(member) => Ok(member?.map(ThenSource::Foreign)),
            Err(payload) => {
                tracing::warn!("reading foreign then panicked");
                Err(Error::from_panic(ErrorKind::ThenableAccessThrow, payload.as_ref()).into())
            }
        },
        _ => Ok(None),
    }
}

/// Forwards the eventual outcome of `source` into `resolvers`.
fn adopt(source: &Promise, resolvers: Resolvers) {
    let on_reject = resolvers.clone();
    source.then_with(
        Some(Box::new(move |value| {
            resolvers.resolve(value);
            Ok(Value::Undefined)
        })),
        Some(Box::new(move |reason| {
            on_reject.reject(reason);
            Ok(Value::Undefined)
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromiseConfig;
    use crate::cx::Cx;
    use crate::types::PromiseState;
    use crate::value::PlainObject;
    use std::cell::RefCell;

    fn fresh() -> (Cx, crate::runtime::MicrotaskQueue) {
        Cx::with_queue(PromiseConfig::default())
    }

    #[test]
    fn plain_value_fulfills_synchronously() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::from(3), 0);
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from(3))));
    }

    #[test]
    fn self_resolution_is_a_chain_cycle() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::from(&p), 0);
        let reason = p.outcome().and_then(|o| o.reason().cloned()).expect("rejected");
        assert!(reason.as_error().is_some_and(Error::is_chain_cycle));
    }

    #[test]
    fn resolvers_are_single_use() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let resolvers = Resolvers::new(&p, 0);
        let clone = resolvers.clone();
        assert!(!resolvers.is_consumed());
        resolvers.resolve(1);
        clone.reject("late");
        clone.resolve(2);
        assert!(clone.is_consumed());
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from(1))));
    }

    #[test]
    fn sync_thenable_unwraps_immediately() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let thenable = Value::thenable(|r| {
            r.resolve("inner");
            Ok(())
        });
        resolve_value(&p, thenable, 0);
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from("inner"))));
    }

    #[test]
    fn thenable_calling_both_capabilities_settles_once() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let thenable = Value::thenable(|r| {
            r.reject("first");
            r.resolve("second");
            r.reject("third");
            Ok(())
        });
        resolve_value(&p, thenable, 0);
        assert_eq!(p.outcome(), Some(Settled::Rejected(Value::from("first"))));
    }

    #[test]
    fn throw_after_resolve_is_ignored() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let thenable = Value::thenable(|r| {
            r.resolve(1);
            Err(Value::from("too late"))
        });
        resolve_value(&p, thenable, 0);
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from(1))));
    }

    #[test]
    fn throw_before_resolve_rejects() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::thenable(|_| Err(Value::from("nope"))), 0);
        assert_eq!(p.outcome(), Some(Settled::Rejected(Value::from("nope"))));
    }

    #[test]
    fn late_call_after_throw_is_ignored() {
        let (cx, queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let stash: Rc<RefCell<Option<Resolvers>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&stash);
        resolve_value(
            &p,
            Value::thenable(move |r| {
                *slot.borrow_mut() = Some(r);
                Err(Value::from("thrown"))
            }),
            0,
        );
        let resolvers = stash.borrow_mut().take().expect("then invoked");
        assert!(resolvers.is_consumed());
        resolvers.resolve(5);
        resolvers.reject("later");
        queue.run_until_idle().expect("drain");
        assert_eq!(p.outcome(), Some(Settled::Rejected(Value::from("thrown"))));
    }

    #[test]
    fn panicking_then_rejects_with_access_throw() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::thenable(|_| panic!("then exploded")), 0);
        let reason = p.outcome().and_then(|o| o.reason().cloned()).expect("rejected");
        let err = reason.as_error().expect("core error");
        assert_eq!(err.kind(), ErrorKind::ThenableAccessThrow);
        assert_eq!(err.message(), Some("then exploded"));
    }

    #[derive(Debug)]
    struct FailingAccess;

    impl crate::value::Thenable for FailingAccess {
        fn then_member(&self) -> Result<Option<ThenHook>, Value> {
            Err(Value::from("getter threw"))
        }
    }

    #[test]
    fn failing_member_access_rejects() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::object(FailingAccess), 0);
        assert_eq!(p.outcome(), Some(Settled::Rejected(Value::from("getter threw"))));
    }

    #[test]
    fn non_callable_then_fulfills_with_object() {
        let (cx, _queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let obj = Value::object(PlainObject::new().with_field("then", 42));
        resolve_value(&p, obj.clone(), 0);
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(obj)));
    }

    #[test]
    fn deferred_thenable_settles_later() {
        let (cx, queue) = fresh();
        let p = Promise::pending_cell(&cx);
        let stash: Rc<RefCell<Option<Resolvers>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&stash);
        resolve_value(
            &p,
            Value::thenable(move |r| {
                *slot.borrow_mut() = Some(r);
                Ok(())
            }),
            0,
        );
        assert_eq!(p.state(), PromiseState::Pending);
        let resolvers = stash.borrow_mut().take().expect("then invoked");
        resolvers.resolve(9);
        queue.run_until_idle().expect("drain");
        assert_eq!(p.outcome(), Some(Settled::Fulfilled(Value::from(9))));
    }

    #[test]
    fn adopting_a_pending_promise_waits_for_it() {
        let (cx, queue) = fresh();
        let (source, source_resolvers) = Promise::pending(&cx);
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, Value::from(&source), 0);
        queue.run_until_idle().expect("drain");
        assert_eq!(p.state(), PromiseState::Pending);

        source_resolvers.reject("late failure");
        queue.run_until_idle().expect("drain");
        assert_eq!(p.outcome(), Some(Settled::Rejected(Value::from("late failure"))));
    }

    #[test]
    fn depth_limit_stops_self_feeding_thenable() {
        fn endless() -> Value {
            Value::thenable(|r| {
                r.resolve(endless());
                Ok(())
            })
        }

        let (cx, _queue) = Cx::with_queue(PromiseConfig::default().max_unwrap_depth(16));
        let p = Promise::pending_cell(&cx);
        resolve_value(&p, endless(), 0);
        let reason = p.outcome().and_then(|o| o.reason().cloned()).expect("rejected");
        assert_eq!(
            reason.as_error().map(Error::kind),
            Some(ErrorKind::UnwrapDepthExceeded)
        );
    }
}
