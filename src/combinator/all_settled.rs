//! Aggregation that waits for every input.
//!
//! Each input contributes a [`Settled`] descriptor at its input index. The
//! aggregate never rejects for an input's rejection; only non-list input
//! rejects it.

use super::{elements, Slots};
use crate::cx::Cx;
use crate::promise::{Handler, Promise};
use crate::types::Settled;
use crate::value::Value;
use std::rc::Rc;

impl Promise {
    /// Fulfills, once every input has settled, with one descriptor per
    /// input in input order.
    ///
    /// Non-list input rejects with `InvalidAggregateInput`. An empty list
    /// fulfills immediately with an empty list.
    pub fn all_settled(cx: &Cx, input: impl Into<Value>) -> Self {
        let aggregate = Self::pending_cell(cx);
        let items = match elements(input.into(), "all_settled") {
            Ok(items) => items,
            Err(reason) => {
                aggregate.settle(Settled::Rejected(reason));
                return aggregate;
            }
        };
        tracing::debug!(promise_id = %aggregate.id(), inputs = items.len(), "all_settled started");
        if items.is_empty() {
            aggregate.settle(Settled::Fulfilled(Value::List(Vec::new())));
            return aggregate;
        }

        let slots = Slots::shared(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let record = |outcome: fn(Value) -> Settled| -> Handler {
                let slots = Rc::clone(&slots);
                let target = aggregate.clone();
                Box::new(move |payload: Value| {
                    let done = slots.borrow_mut().fill(index, outcome(payload).into());
                    if let Some(descriptors) = done {
                        target.settle(Settled::Fulfilled(Value::List(descriptors)));
                    }
                    Ok(Value::Undefined)
                })
            };
            Self::resolve(cx, item).then_with(
                Some(record(Settled::Fulfilled)),
                Some(record(Settled::Rejected)),
            );
        }
        aggregate
    }
}
