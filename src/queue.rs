use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A thread-safe FIFO queue with blocking and non-blocking removal.
///
/// All operations take the internal lock, so they are mutually
/// exclusive with respect to each other on the same instance.
/// `wait_and_pop` suspends the caller on a condition variable until an
/// item arrives; `push` wakes one waiter per insertion.
pub struct SyncQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> SyncQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        SyncQueue {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Inserts an item at the tail and wakes one blocked `wait_and_pop`
    /// caller. Multiple waiters are woken one per push, not all at once.
    pub fn push(&self, item: T) {
        let mut items = self.lock();
        items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Removes and returns the head if the queue is non-empty.
    /// Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Blocks the calling thread until an item is available, then
    /// removes and returns the head.
    ///
    /// The emptiness condition is re-checked in a loop: a spurious
    /// wake-up, or another thread draining the queue between the
    /// notification and this thread reacquiring the lock, sends the
    /// caller back to waiting instead of popping from an empty deque.
    pub fn wait_and_pop(&self) -> T {
        let mut items = self.lock();
        loop {
            match items.pop_front() {
                Some(item) => return item,
                None => {
                    items = self
                        .not_empty
                        .wait(items)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Whether the queue is empty at the instant of the call.
    ///
    /// The answer can be stale by the time the caller acts on it;
    /// provided for diagnostics, not for synchronization.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued items at the instant of the call. Same
    /// staleness caveat as [`SyncQueue::is_empty`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Locks the deque, recovering from poisoning. Every critical
    /// section leaves the deque structurally valid, so the data is
    /// safe to use even after a peer thread panicked while holding
    /// the lock.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for SyncQueue<T> {
    fn default() -> Self {
        SyncQueue::new()
    }
}

impl<T: Clone> Clone for SyncQueue<T> {
    /// Takes a consistent snapshot of `source`'s contents under
    /// `source`'s lock.
    fn clone(&self) -> Self {
        let items = self.lock().clone();
        SyncQueue {
            items: Mutex::new(items),
            not_empty: Condvar::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let queue = SyncQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.wait_and_pop(), 1);
        assert_eq!(queue.wait_and_pop(), 2);
        assert_eq!(queue.wait_and_pop(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn try_pop_on_empty_is_none() {
        let queue: SyncQueue<u32> = SyncQueue::new();
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn clone_snapshots_contents() {
        let queue = SyncQueue::new();
        queue.push("a");
        queue.push("b");
        let copy = queue.clone();
        // Draining the original leaves the snapshot intact.
        assert_eq!(queue.try_pop(), Some("a"));
        assert_eq!(queue.try_pop(), Some("b"));
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.try_pop(), Some("a"));
    }
}
