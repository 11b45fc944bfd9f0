//! The capability context type.

use crate::config::PromiseConfig;
use crate::runtime::{MicrotaskQueue, Schedule, Task};
use std::fmt;
use std::rc::Rc;

/// Scheduling capability shared by a family of promise cells.
///
/// # Cloning
///
/// `Cx` is cheaply clonable (it wraps an `Rc`). Clones share the same
/// scheduler and configuration.
///
/// # Example
///
/// ```
/// use pledge::{Cx, Promise, PromiseConfig, Value};
///
/// let (cx, queue) = Cx::with_queue(PromiseConfig::default());
/// let p = Promise::resolve(&cx, 1).then(|v| Ok(Value::from(v.as_int().unwrap_or(0) + 1)));
/// queue.run_until_idle().unwrap();
/// assert_eq!(p.outcome().and_then(|o| o.value().cloned()), Some(Value::from(2)));
/// ```
#[derive(Clone)]
pub struct Cx {
    inner: Rc<CxInner>,
}

struct CxInner {
    scheduler: Rc<dyn Schedule>,
    config: PromiseConfig,
}

impl Cx {
    /// Creates a context that defers through `scheduler`.
    #[must_use]
    pub fn new<S: Schedule + 'static>(scheduler: S, config: PromiseConfig) -> Self {
        Self::from_shared(Rc::new(scheduler), config)
    }

    /// Creates a context from an already shared scheduler.
    #[must_use]
    pub fn from_shared(scheduler: Rc<dyn Schedule>, config: PromiseConfig) -> Self {
        Self {
            inner: Rc::new(CxInner { scheduler, config }),
        }
    }

    /// Creates a context backed by a fresh [`MicrotaskQueue`].
    ///
    /// The queue honors `config.drain_step_limit`. The returned handle drives it.
    #[must_use]
    pub fn with_queue(config: PromiseConfig) -> (Self, MicrotaskQueue) {
        let queue = MicrotaskQueue::with_step_limit(config.drain_step_limit);
        (Self::new(queue.clone(), config), queue)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PromiseConfig {
        &self.inner.config
    }

    /// Defers `task` through the injected scheduler.
    pub fn schedule(&self, task: Task) {
        self.inner.scheduler.schedule(task);
    }

    /// Returns true if both handles share one context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Cx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
