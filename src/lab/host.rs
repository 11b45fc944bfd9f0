//! Deterministic host: a microtask queue plus virtual timers.
//!
//! # Determinism Guarantees
//!
//! - Microtasks always drain completely before the next timer fires
//! - Timers fire by deadline, then by registration order
//! - No wall-clock dependencies: time only moves when a timer fires or
//!   [`LabHost::run_until`] advances it

use crate::config::PromiseConfig;
use crate::cx::Cx;
use crate::runtime::{DrainError, MicrotaskQueue};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

type TimerCallback = Box<dyn FnOnce()>;

struct Timer {
    deadline: Duration,
    timer_id: u64,
    callback: TimerCallback,
}

impl Eq for Timer {}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.timer_id == other.timer_id
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest deadline first, then lowest timer_id.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.timer_id.cmp(&self.timer_id))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle returned by [`LabHost::set_timeout`], used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    timer_id: u64,
    deadline: Duration,
}

impl TimerHandle {
    /// Returns the virtual time at which the timer fires.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Summary of one [`LabHost::run`] or [`LabHost::run_until`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabReport {
    /// Timers whose callbacks ran.
    pub timers_fired: usize,
    /// Microtasks executed.
    pub tasks_run: usize,
    /// Virtual time when the run stopped.
    pub now: Duration,
}

#[derive(Default)]
struct Timers {
    heap: BinaryHeap<Timer>,
    now: Duration,
    next_timer_id: u64,
    cancelled: HashSet<u64>,
}

impl Timers {
    /// Pops the next live timer due at or before `limit`.
    fn pop_due(&mut self, limit: Option<Duration>) -> Option<Timer> {
        loop {
            let next = self.heap.peek()?;
            if limit.is_some_and(|limit| next.deadline > limit) {
                return None;
            }
            let timer = self.heap.pop()?;
            if self.cancelled.remove(&timer.timer_id) {
                continue;
            }
            return Some(timer);
        }
    }
}

/// A single-threaded host that drives promise cells deterministically.
///
/// Clones share the same queue, clock and timers, so a timer callback can
/// capture a clone to register further timers.
#[derive(Clone)]
pub struct LabHost {
    queue: MicrotaskQueue,
    cx: Cx,
    timers: Rc<RefCell<Timers>>,
}

impl LabHost {
    /// Creates a host at virtual time zero.
    #[must_use]
    pub fn new(config: PromiseConfig) -> Self {
        let (cx, queue) = Cx::with_queue(config);
        Self {
            queue,
            cx,
            timers: Rc::new(RefCell::new(Timers::default())),
        }
    }

    /// Returns the context whose cells dispatch through this host's queue.
    #[must_use]
    pub fn cx(&self) -> &Cx {
        &self.cx
    }

    /// Returns the microtask queue.
    #[must_use]
    pub fn queue(&self) -> &MicrotaskQueue {
        &self.queue
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timers.borrow().now
    }

    /// Returns the number of timers that have not fired or been cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        let timers = self.timers.borrow();
        timers
            .heap
            .iter()
            .filter(|t| !timers.cancelled.contains(&t.timer_id))
            .count()
    }

    /// Registers `callback` to run `delay` after the current virtual time.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + 'static,
    {
        let mut timers = self.timers.borrow_mut();
        let timer_id = timers.next_timer_id;
        timers.next_timer_id += 1;
        let deadline = timers.now.saturating_add(delay);
        timers.heap.push(Timer {
            deadline,
            timer_id,
            callback: Box::new(callback),
        });
        tracing::trace!(timer_id, deadline_ms = deadline.as_millis(), "timer registered");
        TimerHandle { timer_id, deadline }
    }

    /// Cancels a timer. Cancelling a fired or unknown timer does nothing.
    pub fn clear_timeout(&self, handle: TimerHandle) {
        let mut timers = self.timers.borrow_mut();
        if timers.heap.iter().any(|t| t.timer_id == handle.timer_id) {
            timers.cancelled.insert(handle.timer_id);
        }
    }

    /// Runs microtasks and timers until both are exhausted.
    pub fn run(&self) -> Result<LabReport, DrainError> {
        self.drive(None)
    }

    /// Runs microtasks and every timer due at or before `deadline`, then
    /// advances the clock to `deadline`.
    pub fn run_until(&self, deadline: Duration) -> Result<LabReport, DrainError> {
        self.drive(Some(deadline))
    }

    fn drive(&self, limit: Option<Duration>) -> Result<LabReport, DrainError> {
        let mut report = LabReport {
            timers_fired: 0,
            tasks_run: 0,
            now: self.now(),
        };
        loop {
            report.tasks_run += self.queue.run_until_idle()?;
            let next = self.timers.borrow_mut().pop_due(limit);
            let Some(timer) = next else { break };
            {
                let mut timers = self.timers.borrow_mut();
                timers.now = timers.now.max(timer.deadline);
            }
            tracing::trace!(
                timer_id = timer.timer_id,
                now_ms = timer.deadline.as_millis(),
                "timer fired"
            );
            (timer.callback)();
            report.timers_fired += 1;
        }
        if let Some(limit) = limit {
            let mut timers = self.timers.borrow_mut();
            timers.now = timers.now.max(limit);
        }
        report.now = self.now();
        tracing::debug!(
            timers_fired = report.timers_fired,
            tasks_run = report.tasks_run,
            now_ms = report.now.as_millis(),
            "lab run finished"
        );
        Ok(report)
    }
}

impl Default for LabHost {
    fn default() -> Self {
        Self::new(PromiseConfig::default())
    }
}

impl fmt::Debug for LabHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabHost")
            .field("now", &self.now())
            .field("pending_timers", &self.pending_timers())
            .field("queue", &self.queue)
            .finish()
    }
}
