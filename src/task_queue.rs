use std::any::Any;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::future::{promise, Promise, TaskFuture};
use crate::queue::SyncQueue;
use crate::{Error, Result};

/// A pool of worker threads draining a shared queue of one-shot tasks.
///
/// Each posted task is paired with a promise; whichever worker
/// dequeues the task executes it and publishes the outcome through
/// that promise exactly once. Workers block on the queue's condition
/// variable between tasks; there is no polling loop.
///
/// Tasks are dispatched in FIFO order, but with more than one worker
/// no completion order is guaranteed across workers.
pub struct TaskQueue {
    queue: Arc<SyncQueue<Message>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stopped: Arc<AtomicBool>,
}

/// A queued unit of work, or the shutdown sentinel that tells one
/// worker to exit.
enum Message {
    Run(Box<dyn Job>),
    Stop,
}

/// Type-erased packaged task. `run` executes the work and fulfills
/// the promise; `cancel` fails the promise without executing, for
/// tasks drained at shutdown.
trait Job: Send {
    fn run(self: Box<Self>);
    fn cancel(self: Box<Self>);
}

struct Packaged<F, R> {
    work: F,
    promise: Promise<R>,
}

impl<F, R> Job for Packaged<F, R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    fn run(self: Box<Self>) {
        let Packaged { work, promise } = *self;
        // Catch panics so the worker loop continues and the failure
        // reaches whoever holds the future instead of dying with the
        // thread.
        match catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => {
                let _ = promise.set(value);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("task panicked: {message}");
                let _ = promise.fail(Error::TaskPanicked(message));
            }
        }
    }

    fn cancel(self: Box<Self>) {
        let _ = self.promise.fail(Error::QueueStopped);
    }
}

impl TaskQueue {
    /// Creates a pool with the given number of worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoWorkers`] if `threads` is zero.
    pub fn new(threads: u32) -> Result<TaskQueue> {
        if threads == 0 {
            return Err(Error::NoWorkers);
        }

        let queue = Arc::new(SyncQueue::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let workers = (0..threads)
            .map(|id| spawn_worker(id, queue.clone(), stopped.clone()))
            .collect();

        Ok(TaskQueue {
            queue,
            workers: Mutex::new(workers),
            stopped,
        })
    }

    /// Packages `work` with a fresh promise, enqueues it, and returns
    /// the future immediately. The call never blocks.
    ///
    /// Posting to a stopped queue returns a future already failed
    /// with [`Error::QueueStopped`].
    pub fn post_task<F, R>(&self, work: F) -> TaskFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (writer, future) = promise();
        if self.stopped.load(Ordering::SeqCst) {
            let _ = writer.fail(Error::QueueStopped);
            return future;
        }
        self.queue.push(Message::Run(Box::new(Packaged {
            work,
            promise: writer,
        })));
        future
    }

    /// Pops and executes one queued task on the calling thread.
    /// Returns whether a task was run.
    ///
    /// This lets a thread that is blocked on a sub-task's future make
    /// progress on other queued work instead of idling, so the pool
    /// can be saturated with waiting tasks without deadlocking.
    pub fn run_pending_task(&self) -> bool {
        match self.queue.try_pop() {
            Some(Message::Run(job)) => {
                job.run();
                true
            }
            Some(Message::Stop) => {
                // A shutdown sentinel belongs to a worker; put it back.
                self.queue.push(Message::Stop);
                false
            }
            None => false,
        }
    }

    /// Stops the pool: workers exit after their current task, and
    /// every queued-but-unexecuted task fails its future with
    /// [`Error::QueueStopped`]. In-flight tasks are not cancelled.
    ///
    /// Idempotent; called automatically on drop.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let workers = mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        // One sentinel per worker wakes every blocked wait_and_pop.
        for _ in &workers {
            self.queue.push(Message::Stop);
        }
        for worker in workers {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }

        while let Some(message) = self.queue.try_pop() {
            if let Message::Run(job) = message {
                job.cancel();
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns a single worker thread that drains the shared queue until
/// the pool is stopped.
///
/// The flag is re-checked between tasks so a worker exits after its
/// current task rather than after draining the whole queue; the
/// sentinel exists to wake workers blocked in `wait_and_pop`.
fn spawn_worker(
    id: u32,
    queue: Arc<SyncQueue<Message>>,
    stopped: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("task-worker-{id}"))
        .spawn(move || loop {
            if stopped.load(Ordering::SeqCst) {
                debug!("worker {id} stopping");
                return;
            }
            match queue.wait_and_pop() {
                Message::Run(job) => {
                    debug!("worker {id} executing task");
                    job.run();
                }
                Message::Stop => {
                    debug!("worker {id} stopping");
                    return;
                }
            }
        })
        .expect("failed to spawn worker thread")
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_an_error() {
        assert!(matches!(TaskQueue::new(0), Err(Error::NoWorkers)));
    }

    #[test]
    fn post_and_get() {
        let pool = TaskQueue::new(2).unwrap();
        let future = pool.post_task(|| 42);
        assert_eq!(future.get().unwrap(), 42);
    }

    #[test]
    fn post_after_stop_fails_immediately() {
        let pool = TaskQueue::new(1).unwrap();
        pool.stop();
        let future = pool.post_task(|| 1);
        assert_eq!(future.get(), Err(Error::QueueStopped));
    }
}
