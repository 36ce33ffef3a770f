//! Cooperative timer scheduler for the script runtime.
//!
//! Every unit of script work is a task attached to a timer: `spawn` is a timer
//! due immediately, `set_timeout` fires once, `set_interval` re-arms itself.
//! `run_till_no_more_tasks` runs due tasks one at a time, in due order, until
//! nothing is runnable at the given instant. Tasks never run concurrently.
//!
//! Design notes:
//! - Tasks schedule or clear timers through a `Scope`. New timers are queued
//!   and merged before the next task is picked, so a task can spawn follow-up
//!   work that still runs in the same pass.
//! - An interval is re-armed relative to the pass instant, not its previous
//!   due time, so a late pass does not replay missed ticks.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::sink::StreamSink;

/// Shortest interval accepted; zero periods would keep a pass from ending.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A unit of script work.
pub type Task = Box<dyn FnMut(&mut Scope<'_>) + Send>;

/// Handle for clearing a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    due: Instant,
    period: Option<Duration>,
    task: Task,
}

/// Timers scheduled or cleared since the last merge.
#[derive(Default)]
struct TimerQueue {
    next_id: u64,
    added: Vec<Timer>,
    cleared: HashSet<TimerId>,
}

impl TimerQueue {
    fn push(&mut self, due: Instant, period: Option<Duration>, task: Task) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.added.push(Timer {
            id,
            due,
            period,
            task,
        });
        id
    }
}

/// What a running task (or an invoked script method) may touch.
pub struct Scope<'a> {
    host: Option<&'a Arc<dyn StreamSink>>,
    queue: &'a mut TimerQueue,
    now: Instant,
}

impl Scope<'_> {
    /// Host callbacks bound into the runtime, if any.
    pub fn host(&self) -> Option<&Arc<dyn StreamSink>> {
        self.host
    }

    /// Instant of the current scheduler pass.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Run `task` once, as soon as possible.
    pub fn spawn<F>(&mut self, task: F) -> TimerId
    where
        F: FnMut(&mut Scope<'_>) + Send + 'static,
    {
        self.set_timeout(Duration::ZERO, task)
    }

    /// Run `task` once after `delay`.
    pub fn set_timeout<F>(&mut self, delay: Duration, task: F) -> TimerId
    where
        F: FnMut(&mut Scope<'_>) + Send + 'static,
    {
        self.queue.push(self.now + delay, None, Box::new(task))
    }

    /// Run `task` every `period`, first after one period has passed.
    pub fn set_interval<F>(&mut self, period: Duration, task: F) -> TimerId
    where
        F: FnMut(&mut Scope<'_>) + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        self.queue.push(self.now + period, Some(period), Box::new(task))
    }

    /// Cancel a timer. Clearing an interval from inside its own task stops it
    /// after the current run.
    pub fn clear(&mut self, id: TimerId) {
        self.queue.cleared.insert(id);
    }
}

/// Single-threaded run queue of timers.
#[derive(Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
    queue: TimerQueue,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope for scheduling work from outside a task, e.g. from a script
    /// method invoked by the host.
    pub fn scope<'a>(&'a mut self, host: Option<&'a Arc<dyn StreamSink>>, now: Instant) -> Scope<'a> {
        Scope {
            host,
            queue: &mut self.queue,
            now,
        }
    }

    fn merge(&mut self) {
        self.timers.append(&mut self.queue.added);
        if !self.queue.cleared.is_empty() {
            let cleared = std::mem::take(&mut self.queue.cleared);
            self.timers.retain(|t| !cleared.contains(&t.id));
        }
    }

    fn next_due(&self, now: Instant) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(pos, _)| pos)
    }

    /// Run every task due at `now`, including work those tasks schedule for
    /// `now`, until nothing is runnable. Returns the number of tasks run.
    pub fn run_till_no_more_tasks(&mut self, now: Instant, host: Option<&Arc<dyn StreamSink>>) -> usize {
        let mut ran = 0;
        loop {
            self.merge();
            let Some(pos) = self.next_due(now) else {
                break;
            };
            let mut timer = self.timers.swap_remove(pos);
            {
                let mut scope = Scope {
                    host,
                    queue: &mut self.queue,
                    now,
                };
                (timer.task)(&mut scope);
            }
            ran += 1;

            if let Some(period) = timer.period {
                if !self.queue.cleared.remove(&timer.id) {
                    timer.due = now + period;
                    self.timers.push(timer);
                }
            }
        }
        ran
    }

    /// Earliest instant at which some task becomes runnable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .iter()
            .chain(self.queue.added.iter())
            .map(|t| t.due)
            .min()
    }

    /// Number of armed timers, intervals included.
    pub fn pending(&self) -> usize {
        self.timers.len() + self.queue.added.len()
    }
}
