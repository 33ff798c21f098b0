use parking_lot::Mutex;
use std::time::Duration;

use super::queue::{Scheduled, TaskQueue};
use super::{Clock, Task, Timer};

/**
 * Virtual clock that only moves when told to.
 *
 * Scheduled tasks run on the thread calling `advance`, in due order, with the clock
 * set to each task's due time while it runs. Tasks scheduled by a running task are
 * picked up in the same `advance` call if they fall inside the window.
 */
#[derive(Default)]
pub struct ManualClock {
    inner: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: TaskQueue,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    /// Moves the clock forward by `by`, running every task that falls due on the way.
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.lock().now + by;
        let mut ran = 0;

        loop {
            // Lock is released before the task runs; tasks schedule more tasks.
            let next = {
                let mut state = self.inner.lock();
                let next = state.queue.pop_due(target);
                if let Some(scheduled) = &next {
                    state.now = state.now.max(scheduled.due);
                }
                next
            };

            match next {
                Some(scheduled) => {
                    (scheduled.task)();
                    ran += 1;
                }
                None => break,
            }
        }

        let mut state = self.inner.lock();
        state.now = state.now.max(target);
        ran
    }

    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }
}

impl Timer for ManualClock {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.inner.lock();
        let scheduled = Scheduled {
            due: state.now + delay,
            seq: state.seq,
            task,
        };
        state.seq += 1;
        state.queue.push(scheduled);
    }
}
