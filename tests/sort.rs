use std::sync::Arc;

use rand::prelude::*;

use workline::{quick_sort, ParallelSorter, TaskQueue};

#[test]
fn sequential_path_sorts() {
    // Threshold above the input size keeps everything on one thread.
    let sorter = ParallelSorter::with_threshold(2, 1_000).unwrap();
    assert_eq!(sorter.sort(vec![5, 3, 8, 1]).unwrap(), vec![1, 3, 5, 8]);
}

#[test]
fn fully_asynchronous_path_sorts() {
    // Threshold zero forks on every recursion step.
    let sorter = ParallelSorter::with_threshold(2, 0).unwrap();
    assert_eq!(sorter.sort(vec![5, 3, 8, 1]).unwrap(), vec![1, 3, 5, 8]);
}

#[test]
fn sorts_empty_and_singleton() {
    let sorter = ParallelSorter::with_threshold(2, 0).unwrap();
    assert_eq!(sorter.sort(Vec::<i32>::new()).unwrap(), Vec::<i32>::new());
    assert_eq!(sorter.sort(vec![9]).unwrap(), vec![9]);
}

#[test]
fn sort_is_idempotent() {
    let sorter = ParallelSorter::with_threshold(4, 8).unwrap();
    let once = sorter.sort(vec![4, 4, 2, 9, 1, 1, 7]).unwrap();
    let twice = sorter.sort(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn output_is_an_ordered_permutation_of_the_input() {
    let mut rng = thread_rng();
    let input: Vec<u32> = (0..10_000).map(|_| rng.gen_range(0..1_000)).collect();

    let mut oracle = input.clone();
    oracle.sort_unstable();

    let sequential = quick_sort(input.clone());
    assert_eq!(sequential, oracle);

    let sorter = ParallelSorter::with_threshold(4, 512).unwrap();
    let parallel = sorter.sort(input).unwrap();
    assert_eq!(parallel, oracle);
}

#[test]
fn sequential_and_adaptive_paths_agree() {
    let mut rng = thread_rng();
    let input: Vec<i64> = (0..5_000).map(|_| rng.gen_range(-500..500)).collect();

    let sequential = quick_sort(input.clone());
    let sorter = ParallelSorter::with_threshold(4, 64).unwrap();
    assert_eq!(sorter.sort(input).unwrap(), sequential);
}

#[test]
fn sorters_can_share_one_task_queue() {
    let pool = Arc::new(TaskQueue::new(4).unwrap());
    let first = ParallelSorter::with_queue(pool.clone(), 16);
    let second = ParallelSorter::with_queue(pool, 16);

    let mut rng = thread_rng();
    let input: Vec<u16> = (0..2_000).map(|_| rng.gen()).collect();
    let mut oracle = input.clone();
    oracle.sort_unstable();

    assert_eq!(first.sort(input.clone()).unwrap(), oracle);
    assert_eq!(second.sort(input).unwrap(), oracle);
}
