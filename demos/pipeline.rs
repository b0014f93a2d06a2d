//! Producer/consumer demo: two producers feed one shared queue, two
//! consumers drain it with blocking pops.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use workline::SyncQueue;

const PER_PRODUCER: i32 = 5;

fn main() {
    env_logger::init();

    let queue = Arc::new(SyncQueue::new());

    let mut handles = Vec::new();
    for start in [1, 100] {
        let queue = queue.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                queue.push(start + i);
                println!("produced: {}", start + i);
                thread::sleep(Duration::from_millis(100));
            }
        }));
    }

    for id in 1..=2 {
        let queue = queue.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..PER_PRODUCER {
                let value = queue.wait_and_pop();
                println!("consumer {id} got value: {value}");
                thread::sleep(Duration::from_millis(200));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    match queue.try_pop() {
        Some(value) => println!("try_pop successful, got: {value}"),
        None => println!("try_pop failed, queue was empty"),
    }
}
