/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::Builder;
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use super::queue::{Scheduled, TaskQueue};
use super::{Clock, Task, Timer};

enum TimerMessage {
    Schedule(Scheduled),
    Terminate,
}

/**
 * Real-time timer backed by a single worker thread.
 *
 * Tasks are sent to the `timer` thread over a crossbeam channel and run there one at a
 * time in due order. Nothing scheduled on this timer ever runs in parallel with another
 * task from the same timer.
 *
 * # Fields
 * - `origin`:      Instant all due times and timestamps are measured from.
 * - `seq`:         Scheduling counter, breaks ties between tasks due at the same time.
 * - `timer_tx`:    Mailbox of the worker thread.
 */
pub struct ThreadTimer {
    origin: Instant,
    seq: AtomicU64,
    timer_tx: cbc::Sender<TimerMessage>,
}

impl ThreadTimer {
    pub fn start() -> std::io::Result<ThreadTimer> {
        let origin = Instant::now();
        let (timer_tx, timer_rx) = cbc::unbounded::<TimerMessage>();

        let timer_thread = Builder::new().name("timer".into());
        timer_thread.spawn(move || run(origin, timer_rx))?;

        Ok(ThreadTimer {
            origin,
            seq: AtomicU64::new(0),
            timer_tx,
        })
    }
}

impl Clock for ThreadTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Timer for ThreadTimer {
    fn schedule(&self, delay: Duration, task: Task) {
        let scheduled = Scheduled {
            due: self.origin.elapsed() + delay,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            task,
        };
        if self.timer_tx.send(TimerMessage::Schedule(scheduled)).is_err() {
            error!("Timer thread is gone, dropping scheduled task");
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        let _ = self.timer_tx.send(TimerMessage::Terminate);
    }
}

fn run(origin: Instant, timer_rx: cbc::Receiver<TimerMessage>) {
    let mut queue = TaskQueue::default();

    loop {
        let message = match queue.next_due() {
            Some(due) => {
                let timeout = due.saturating_sub(origin.elapsed());
                cbc::select! {
                    recv(timer_rx) -> msg => Some(msg),
                    default(timeout) => None,
                }
            }
            None => Some(timer_rx.recv()),
        };

        match message {
            Some(Ok(TimerMessage::Schedule(scheduled))) => queue.push(scheduled),
            Some(Ok(TimerMessage::Terminate)) | Some(Err(_)) => {
                debug!("Timer thread terminated with {} pending tasks", queue.len());
                return;
            }
            None => {}
        }

        while let Some(scheduled) = queue.pop_due(origin.elapsed()) {
            (scheduled.task)();
        }
    }
}
