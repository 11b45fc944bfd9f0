//! Aggregate combinators over sequences of promise cells.
//!
//! Both combinators are built only from [`Promise::resolve`] and
//! [`Promise::then_with`]; they add no primitive behavior of their own.
//!
//! - [`Promise::all`]: fail-fast, fulfills with values in input order
//! - [`Promise::all_settled`]: waits for everything, fulfills with
//!   [`Settled`](crate::Settled) descriptors in input order
//!
//! [`Promise::resolve`]: crate::Promise::resolve
//! [`Promise::then_with`]: crate::Promise::then_with
//! [`Promise::all`]: crate::Promise::all
//! [`Promise::all_settled`]: crate::Promise::all_settled

mod all;
mod all_settled;

use crate::error::{Error, ErrorKind};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Result slots shared by the per-element continuations of one aggregate.
///
/// Slot `i` is written once, when input `i` settles. The aggregate completes
/// when `remaining` reaches zero.
struct Slots {
    values: Vec<Value>,
    remaining: usize,
}

type SharedSlots = Rc<RefCell<Slots>>;

impl Slots {
    fn shared(len: usize) -> SharedSlots {
        Rc::new(RefCell::new(Self {
            values: vec![Value::Undefined; len],
            remaining: len,
        }))
    }

    /// Stores `value` at `index`; returns the finished list once every slot is filled.
    fn fill(&mut self, index: usize, value: Value) -> Option<Vec<Value>> {
        self.values[index] = value;
        self.remaining -= 1;
        (self.remaining == 0).then(|| std::mem::take(&mut self.values))
    }
}

/// Splits aggregate input into its elements.
fn elements(input: Value, combinator: &'static str) -> Result<Vec<Value>, Value> {
    match input {
        Value::List(items) => Ok(items),
        other => {
            tracing::debug!(combinator, input_type = other.type_name(), "aggregate input rejected");
            Err(Error::new(ErrorKind::InvalidAggregateInput)
                .with_message(format!(
                    "{combinator} expects a list, got {}",
                    other.type_name()
                ))
                .into())
        }
    }
}
