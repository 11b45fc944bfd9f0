//! FIFO microtask queue.
//!
//! The queue is a cheap handle: clones share one underlying deque, so the
//! same queue can be injected into a [`Cx`](crate::Cx) and driven from a test
//! or a host loop. Nothing runs until the owner calls [`MicrotaskQueue::run_one`]
//! or [`MicrotaskQueue::run_until_idle`].

use super::{Schedule, Task};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Error returned when draining the queue does not reach idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DrainError {
    /// The drain ran `limit` tasks and the queue was still not empty.
    #[error("microtask queue did not go idle within {limit} steps ({remaining} still queued)")]
    StepLimitExceeded {
        /// Configured step limit.
        limit: u64,
        /// Tasks left in the queue.
        remaining: usize,
    },
}

#[derive(Default)]
struct QueueInner {
    tasks: VecDeque<Task>,
    executed: u64,
}

/// A single-threaded FIFO queue of deferred tasks.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    inner: Rc<RefCell<QueueInner>>,
    step_limit: Option<u64>,
}

impl MicrotaskQueue {
    /// Creates an empty, unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue whose drains stop after `limit` tasks.
    #[must_use]
    pub fn with_step_limit(limit: Option<u64>) -> Self {
        Self {
            inner: Rc::default(),
            step_limit: limit,
        }
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Returns true if no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tasks.is_empty()
    }

    /// Returns the total number of tasks run through this queue.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.inner.borrow().executed
    }

    /// Runs the oldest queued task. Returns false if the queue was empty.
    pub fn run_one(&self) -> bool {
        // The borrow must end before the task runs: tasks schedule more tasks.
        let task = {
            let mut inner = self.inner.borrow_mut();
            let task = inner.tasks.pop_front();
            if task.is_some() {
                inner.executed += 1;
            }
            task
        };
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks, including newly scheduled ones, until the queue is empty.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> Result<usize, DrainError> {
        let mut steps: u64 = 0;
        loop {
            if let Some(limit) = self.step_limit {
                if steps >= limit && !self.is_empty() {
                    let remaining = self.len();
                    tracing::warn!(limit, remaining, "microtask drain hit step limit");
                    return Err(DrainError::StepLimitExceeded { limit, remaining });
                }
            }
            if !self.run_one() {
                break;
            }
            steps += 1;
        }
        tracing::trace!(steps, "microtask queue idle");
        Ok(usize::try_from(steps).unwrap_or(usize::MAX))
    }
}

impl Schedule for MicrotaskQueue {
    fn schedule(&self, task: Task) {
        let mut inner = self.inner.borrow_mut();
        inner.tasks.push_back(task);
        tracing::trace!(queue_len = inner.tasks.len(), "microtask scheduled");
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("len", &self.len())
            .field("executed", &self.executed())
            .field("step_limit", &self.step_limit)
            .finish()
    }
}
