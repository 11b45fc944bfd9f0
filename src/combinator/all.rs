//! Fail-fast aggregation.
//!
//! # Semantics
//!
//! `all([p0, p1, ..., pn])`:
//! 1. Wrap every element with `Promise::resolve`
//! 2. On each fulfillment, store the value at the element's input index
//! 3. When every slot is filled, fulfill with the list of slots
//! 4. On the first rejection, reject with that reason
//!
//! Completion order never affects result order. Settlements observed after
//! the aggregate has rejected are dropped by the first-settlement-wins rule.

use super::{elements, Slots};
use crate::cx::Cx;
use crate::promise::Promise;
use crate::types::Settled;
use crate::value::Value;
use std::rc::Rc;

impl Promise {
    /// Fulfills with every input's value, in input order, or rejects with
    /// the first rejection.
    ///
    /// Non-list input rejects with `InvalidAggregateInput`. An empty list
    /// fulfills immediately with an empty list.
    pub fn all(cx: &Cx, input: impl Into<Value>) -> Self {
        let aggregate = Self::pending_cell(cx);
        let items = match elements(input.into(), "all") {
            Ok(items) => items,
            Err(reason) => {
                aggregate.settle(Settled::Rejected(reason));
                return aggregate;
            }
        };
        tracing::debug!(promise_id = %aggregate.id(), inputs = items.len(), "all started");
        if items.is_empty() {
            aggregate.settle(Settled::Fulfilled(Value::List(Vec::new())));
            return aggregate;
        }

        let slots = Slots::shared(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let on_value = Rc::clone(&slots);
            let fulfill_target = aggregate.clone();
            let reject_target = aggregate.clone();
            Self::resolve(cx, item).then_with(
                Some(Box::new(move |value| {
                    let done = on_value.borrow_mut().fill(index, value);
                    if let Some(values) = done {
                        fulfill_target.settle(Settled::Fulfilled(Value::List(values)));
                    }
                    Ok(Value::Undefined)
                })),
                Some(Box::new(move |reason| {
                    if reject_target.settle(Settled::Rejected(reason)) {
                        tracing::debug!(promise_id = %reject_target.id(), index, "all failed fast");
                    }
                    Ok(Value::Undefined)
                })),
            );
        }
        aggregate
    }
}
