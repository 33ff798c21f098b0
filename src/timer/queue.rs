use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use super::Task;

/// A task waiting for its due time, measured from the owning clock's origin.
pub struct Scheduled {
    pub due: Duration,
    pub seq: u64,
    pub task: Task,
}

// Ordered by due time, then by scheduling order.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

#[derive(Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
}

impl TaskQueue {
    pub fn push(&mut self, scheduled: Scheduled) {
        self.heap.push(Reverse(scheduled));
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(s)| s.due)
    }

    /// Removes the earliest task if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Scheduled> {
        match self.next_due() {
            Some(due) if due <= now => self.heap.pop().map(|Reverse(s)| s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
