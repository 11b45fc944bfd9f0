//! Deferred-task scheduling.
//!
//! Promise cells never run continuations in the caller's turn. Every dispatch
//! goes through a [`Schedule`] implementation injected via [`Cx`](crate::Cx).
//!
//! - [`microtask`]: FIFO, manually stepped queue used by tests and the lab host
//!
//! # Contract
//!
//! An implementation must run each task exactly once, after the scheduling
//! call stack unwinds, and must preserve FIFO order among tasks scheduled in
//! the same synchronous turn.

pub mod microtask;

pub use microtask::{DrainError, MicrotaskQueue};

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Capability to defer a task until the current turn unwinds.
pub trait Schedule {
    /// Enqueues `task` for later execution.
    fn schedule(&self, task: Task);
}

impl<S: Schedule + ?Sized> Schedule for std::rc::Rc<S> {
    fn schedule(&self, task: Task) {
        (**self).schedule(task);
    }
}
