use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{Error, Result};

/// Creates a linked writer/reader pair around a fresh pending cell.
///
/// The [`Promise`] is the write side: it fulfills the cell at most
/// once, with a value or a failure. The [`TaskFuture`] is the
/// exclusive read side: its `get` blocks until the cell is fulfilled
/// and then moves the outcome out.
pub fn promise<T>() -> (Promise<T>, TaskFuture<T>) {
    let cell = Arc::new(Cell {
        state: Mutex::new(State::Pending),
        ready: Condvar::new(),
    });
    (
        Promise { cell: cell.clone() },
        TaskFuture { cell },
    )
}

/// Lifecycle of the shared cell. Once out of `Pending` the outcome
/// never changes; `Taken` is reached only by an exclusive `get`.
enum State<T> {
    Pending,
    Ready(Result<T>),
    Taken,
}

struct Cell<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Cell<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the outcome and wakes every waiter. Reports a double
    /// assignment instead of overwriting.
    fn fulfill(&self, outcome: Result<T>) -> Result<()> {
        let mut state = self.lock();
        if !matches!(*state, State::Pending) {
            return Err(Error::PromiseAlreadySet);
        }
        *state = State::Ready(outcome);
        drop(state);
        // All waiters, not one: broadcast readers may be blocked on
        // the same cell.
        self.ready.notify_all();
        Ok(())
    }

    /// Blocks until the cell leaves `Pending`, re-checking in a loop
    /// against spurious wake-ups.
    fn wait_ready(&self) -> MutexGuard<'_, State<T>> {
        let mut state = self.lock();
        while matches!(*state, State::Pending) {
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state
    }
}

/// Write side of a single-assignment result cell.
///
/// Fulfill it with [`set`](Promise::set) or [`fail`](Promise::fail).
/// Dropping an unfulfilled promise fails its readers with
/// [`Error::BrokenPromise`] rather than leaving them blocked forever.
pub struct Promise<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Promise<T> {
    /// Fulfills the cell with a value, waking every blocked reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PromiseAlreadySet`] if the cell was already
    /// fulfilled; the stored outcome is left untouched.
    pub fn set(&self, value: T) -> Result<()> {
        self.cell.fulfill(Ok(value))
    }

    /// Fulfills the cell with a failure, waking every blocked reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PromiseAlreadySet`] if the cell was already
    /// fulfilled; the stored outcome is left untouched.
    pub fn fail(&self, error: Error) -> Result<()> {
        self.cell.fulfill(Err(error))
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        // No effect if the cell was fulfilled; otherwise readers
        // observe BrokenPromise instead of hanging.
        let _ = self.cell.fulfill(Err(Error::BrokenPromise));
    }
}

/// Exclusive read side of a single-assignment result cell.
///
/// `get` consumes the handle and moves the value out, so a second
/// read is not expressible. Convert to a multi-reader view with
/// [`share`](TaskFuture::share).
pub struct TaskFuture<T> {
    cell: Arc<Cell<T>>,
}

impl<T> TaskFuture<T> {
    /// Blocks until the cell is fulfilled, then returns the value by
    /// move, or the stored failure.
    pub fn get(self) -> Result<T> {
        let mut state = self.cell.wait_ready();
        match mem::replace(&mut *state, State::Taken) {
            State::Ready(outcome) => outcome,
            // wait_ready rules out Pending; Taken requires a previous
            // exclusive get, which consumed the only handle.
            State::Pending | State::Taken => unreachable!("result cell already consumed"),
        }
    }

    /// Whether the cell has been fulfilled. Never blocks.
    pub fn is_ready(&self) -> bool {
        !matches!(*self.cell.lock(), State::Pending)
    }

    /// Blocks until the cell is fulfilled, without consuming the
    /// outcome.
    pub fn wait(&self) {
        drop(self.cell.wait_ready());
    }

    /// Blocks until the cell is fulfilled or `timeout` elapses.
    /// Returns whether the cell is fulfilled. May return early on a
    /// spurious wake-up; callers re-check in a loop.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let state = self.cell.lock();
        if !matches!(*state, State::Pending) {
            return true;
        }
        let (state, _) = self
            .cell
            .ready
            .wait_timeout(state, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        !matches!(*state, State::Pending)
    }

    /// Converts this exclusive handle into a broadcast view that any
    /// number of threads may hold and read independently.
    pub fn share(self) -> SharedFuture<T> {
        SharedFuture { cell: self.cell }
    }
}

/// Broadcast read side of a single-assignment result cell.
///
/// Copies are cheap (`Clone` clones an `Arc`); each copy's `get`
/// blocks independently until the single underlying write and then
/// returns its own copy of the value. Reads are repeatable and never
/// consume the cell.
pub struct SharedFuture<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for SharedFuture<T> {
    fn clone(&self) -> Self {
        SharedFuture {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone> SharedFuture<T> {
    /// Blocks until the cell is fulfilled, then returns a copy of the
    /// value or of the stored failure.
    pub fn get(&self) -> Result<T> {
        let state = self.cell.wait_ready();
        match &*state {
            State::Ready(Ok(value)) => Ok(value.clone()),
            State::Ready(Err(error)) => Err(error.clone()),
            // A shared view only exists after `share` consumed the
            // exclusive handle, so the cell can never be Taken.
            State::Pending | State::Taken => unreachable!("result cell already consumed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let (promise, future) = promise::<u32>();
        promise.set(7).unwrap();
        assert_eq!(future.get().unwrap(), 7);
    }

    #[test]
    fn double_set_is_reported() {
        let (promise, _future) = promise::<u32>();
        promise.set(1).unwrap();
        assert_eq!(promise.set(2), Err(Error::PromiseAlreadySet));
        assert_eq!(promise.fail(Error::QueueStopped), Err(Error::PromiseAlreadySet));
    }

    #[test]
    fn dropped_promise_breaks_future() {
        let (promise, future) = promise::<u32>();
        drop(promise);
        assert_eq!(future.get(), Err(Error::BrokenPromise));
    }

    #[test]
    fn shared_reads_repeat() {
        let (promise, future) = promise::<String>();
        let shared = future.share();
        promise.set("once".to_string()).unwrap();
        assert_eq!(shared.get().unwrap(), "once");
        assert_eq!(shared.clone().get().unwrap(), "once");
        assert_eq!(shared.get().unwrap(), "once");
    }

    #[test]
    fn failure_reaches_all_shared_copies() {
        let (promise, future) = promise::<u32>();
        let a = future.share();
        let b = a.clone();
        promise.fail(Error::QueueStopped).unwrap();
        assert_eq!(a.get(), Err(Error::QueueStopped));
        assert_eq!(b.get(), Err(Error::QueueStopped));
    }
}
