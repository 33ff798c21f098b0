pub mod manual;
pub mod queue;
pub mod thread_timer;

pub use manual::ManualClock;
pub use thread_timer::ThreadTimer;

use std::time::Duration;

/// Deferred unit of work run by a [`Timer`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Monotonic time source. Values are offsets from the clock's own origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;

    fn now_ms(&self) -> u64 {
        u64::try_from(self.now().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Delayed-callback facility. Tasks run one at a time, earliest due first.
pub trait Timer: Clock {
    fn schedule(&self, delay: Duration, task: Task);
}
