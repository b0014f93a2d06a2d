use std::sync::Arc;
use std::time::Duration;

use crate::future::TaskFuture;
use crate::task_queue::TaskQueue;
use crate::Result;

/// Partitions smaller than this are sorted on the calling thread.
///
/// The cutoff bounds the fan-out of concurrently active sub-tasks and
/// keeps dispatch overhead from dominating tiny partitions.
pub const DEFAULT_THRESHOLD: usize = 10_000;

/// Sequential quicksort.
///
/// Consumes the input and returns a new ordered vector. The first
/// element is the pivot; the remainder is partitioned with `< pivot`
/// and both groups are sorted recursively.
pub fn quick_sort<T: Ord>(mut input: Vec<T>) -> Vec<T> {
    if input.len() <= 1 {
        return input;
    }

    let pivot = input.swap_remove(0);
    let (lower, rest): (Vec<T>, Vec<T>) =
        input.into_iter().partition(|item| *item < pivot);

    let mut sorted = quick_sort(lower);
    sorted.push(pivot);
    sorted.extend(quick_sort(rest));
    sorted
}

/// Adaptive fork-join quicksort over a task queue.
///
/// Above the size threshold each recursion posts its lower partition
/// to the pool and sorts the remainder on the calling thread, then
/// joins. Below the threshold it degrades to plain [`quick_sort`].
/// Sub-tasks may end up executed by the posting thread itself while
/// it waits (see [`TaskQueue::run_pending_task`]), so parallelism is
/// opportunistic rather than guaranteed.
pub struct ParallelSorter {
    pool: Arc<TaskQueue>,
    threshold: usize,
}

impl ParallelSorter {
    /// Creates a sorter with one worker per available CPU and the
    /// default threshold.
    pub fn new() -> Result<ParallelSorter> {
        ParallelSorter::with_threshold(num_cpus::get() as u32, DEFAULT_THRESHOLD)
    }

    /// Creates a sorter with an explicit worker count and sequential
    /// cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoWorkers`](crate::Error::NoWorkers) if
    /// `threads` is zero.
    pub fn with_threshold(threads: u32, threshold: usize) -> Result<ParallelSorter> {
        Ok(ParallelSorter {
            pool: Arc::new(TaskQueue::new(threads)?),
            threshold,
        })
    }

    /// Creates a sorter that dispatches onto an existing pool instead
    /// of owning one.
    pub fn with_queue(pool: Arc<TaskQueue>, threshold: usize) -> ParallelSorter {
        ParallelSorter { pool, threshold }
    }

    /// Sorts the input, consuming it and returning a new ordered
    /// vector holding exactly the input's elements.
    ///
    /// # Errors
    ///
    /// Fails if a dispatched sub-task could not complete, e.g. the
    /// underlying pool was stopped mid-sort.
    pub fn sort<T>(&self, input: Vec<T>) -> Result<Vec<T>>
    where
        T: Ord + Send + 'static,
    {
        sort_adaptive(&self.pool, input, self.threshold)
    }
}

fn sort_adaptive<T>(pool: &Arc<TaskQueue>, mut input: Vec<T>, threshold: usize) -> Result<Vec<T>>
where
    T: Ord + Send + 'static,
{
    if input.len() <= 1 {
        return Ok(input);
    }
    if input.len() < threshold {
        return Ok(quick_sort(input));
    }

    let pivot = input.swap_remove(0);
    let (lower, rest): (Vec<T>, Vec<T>) =
        input.into_iter().partition(|item| *item < pivot);

    let task_pool = pool.clone();
    let lower_future =
        pool.post_task(move || sort_adaptive(&task_pool, lower, threshold));
    let sorted_rest = sort_adaptive(pool, rest, threshold)?;
    let mut sorted = join_helping(pool, lower_future)??;

    sorted.push(pivot);
    sorted.extend(sorted_rest);
    Ok(sorted)
}

/// Blocks on a sub-task's future, executing other queued tasks on the
/// calling thread while it is pending. A saturated pool therefore
/// cannot deadlock the recursion: every blocked thread is also a
/// worker.
fn join_helping<R>(pool: &TaskQueue, future: TaskFuture<R>) -> Result<R>
where
    R: Send,
{
    while !future.is_ready() {
        if !pool.run_pending_task() {
            // Queue is empty, so the sub-task is in flight on another
            // thread; the bound keeps us responsive to new queued work.
            future.wait_timeout(Duration::from_millis(1));
        }
    }
    future.get()
}
