//! Sorting demo: posts a couple of tasks to a task queue, then
//! compares sequential quicksort against the adaptive parallel sorter
//! on the same random input.

use std::time::Instant;

use rand::prelude::*;

use workline::{quick_sort, ParallelSorter, TaskQueue};

const SIZE: usize = 1_000_000;

fn main() {
    env_logger::init();

    // Task queue warm-up: futures deliver values computed elsewhere.
    let pool = TaskQueue::new(2).expect("failed to create task queue");
    let sum = pool.post_task(|| (1..=100u64).sum::<u64>());
    println!("posted task computed: {}", sum.get().expect("task failed"));
    pool.stop();

    let mut rng = thread_rng();
    let data: Vec<u32> = (0..SIZE).map(|_| rng.gen_range(1..=SIZE as u32)).collect();

    let start = Instant::now();
    let sequential = quick_sort(data.clone());
    let sequential_time = start.elapsed();

    let sorter = ParallelSorter::new().expect("failed to create sorter");
    let start = Instant::now();
    let parallel = sorter.sort(data).expect("parallel sort failed");
    let parallel_time = start.elapsed();

    println!("sorted {SIZE} integers");
    println!("sequential: {sequential_time:?}");
    println!("parallel:   {parallel_time:?}");
    println!(
        "results match: {}",
        if sequential == parallel { "yes" } else { "no" }
    );
}
