//! Broadcast demo: three threads block on copies of one shared future
//! until the main thread sets the single underlying value.

use std::thread;
use std::time::Duration;

use workline::promise;

fn main() {
    env_logger::init();

    let (writer, future) = promise::<i32>();
    let shared = future.share();

    let handles: Vec<_> = (0..3)
        .map(|id| {
            let shared = shared.clone();
            thread::spawn(move || {
                println!("thread {id} waiting for value...");
                let value = shared.get().expect("value was never set");
                println!("thread {id} got value: {value}");
            })
        })
        .collect();

    thread::sleep(Duration::from_secs(1));
    println!("main thread setting the value...");
    writer.set(42).expect("value already set");

    for handle in handles {
        handle.join().expect("waiter thread panicked");
    }
}
