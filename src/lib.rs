#![deny(missing_docs)]

//! Composable thread-based concurrency primitives.
//!
//! This library provides a blocking FIFO queue, single-assignment
//! promise/future pairs with a broadcast variant, a task queue that
//! executes posted work on a pool of worker threads, and an adaptive
//! fork-join quicksort built on top of the task queue.

mod error;
mod future;
mod queue;
mod sort;
mod task_queue;

pub use error::{Error, Result};
pub use future::{promise, Promise, SharedFuture, TaskFuture};
pub use queue::SyncQueue;
pub use sort::{quick_sort, ParallelSorter, DEFAULT_THRESHOLD};
pub use task_queue::TaskQueue;
