//! Cancellable scheduled callbacks for a single-threaded event loop.
//!
//! Nothing runs on its own: the loop calls [`Scheduler::fire_due`] with the
//! current instant and applies whatever fired. Every task carries the
//! generation of the session that scheduled it so a late firing can be told
//! apart from a live one.

use std::time::{Duration, Instant};

/// Period of the session clock.
pub const SESSION_TICK: Duration = Duration::from_secs(1);

/// How long the mistake alert stays visible.
pub const MISTAKE_ALERT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    SessionTick,
    ClearMistakeAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub task: Task,
    pub generation: u64,
    pub due: Instant,
}

#[derive(Debug)]
struct Scheduled {
    handle: TaskHandle,
    task: Task,
    generation: u64,
    due: Instant,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Scheduled>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(
        &mut self,
        task: Task,
        generation: u64,
        now: Instant,
        delay: Duration,
    ) -> TaskHandle {
        self.push(task, generation, now + delay, None)
    }

    pub fn schedule_every(
        &mut self,
        task: Task,
        generation: u64,
        now: Instant,
        period: Duration,
    ) -> TaskHandle {
        self.push(task, generation, now + period, Some(period))
    }

    fn push(
        &mut self,
        task: Task,
        generation: u64,
        due: Instant,
        period: Option<Duration>,
    ) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Scheduled {
            handle,
            task,
            generation,
            due,
            period,
        });
        handle
    }

    /// Returns false when the task already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    /// Collect every firing due at or before `now`, oldest first.
    ///
    /// Periodic tasks fire once per elapsed period, so a loop that stalled for
    /// three seconds still sees three session ticks.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Fired> {
        let mut fired = Vec::new();

        for entry in &mut self.entries {
            while entry.due <= now {
                fired.push(Fired {
                    task: entry.task,
                    generation: entry.generation,
                    due: entry.due,
                });
                match entry.period {
                    Some(period) => entry.due += period,
                    None => break,
                }
            }
        }

        self.entries
            .retain(|entry| entry.period.is_some() || entry.due > now);
        fired.sort_by_key(|f| f.due);
        fired
    }
}
