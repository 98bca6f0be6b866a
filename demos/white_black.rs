// SPDX-License-Identifier: MIT OR Apache-2.0
//! White and black workers sharing one resource.
//!
//! Five workers of each class start 50ms apart, alternating classes, and each holds the
//! resource for 100-600ms. Run with `RUST_LOG=trace` to see every admission and release.
//!
//! ```text
//! RUST_LOG=debug cargo run --example white_black
//! ```

use fair_class_lock::{Class, FairClassLock};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WORKERS_PER_CLASS: usize = 5;
const MAX_PER_TURN: usize = 3;

/// Picks a random amount of simulated work between 100 and 600ms.
fn work_duration(class: Class, id: usize) -> Duration {
    let mut hasher = RandomState::new().build_hasher();
    (class, id).hash(&mut hasher);
    Duration::from_millis(100 + hasher.finish() % 500)
}

fn worker(lock: &FairClassLock, class: Class, id: usize) {
    println!("[{class} {id}] started, requesting the resource");
    let guard = lock.acquire(class);
    println!("[{class} {id}] admitted ({lock})");
    thread::sleep(work_duration(class, id));
    guard.release();
    println!("[{class} {id}] released ({lock})");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let lock = Arc::new(FairClassLock::with_max_per_turn(MAX_PER_TURN)?);
    println!(
        "=== {WORKERS_PER_CLASS} white and {WORKERS_PER_CLASS} black workers, max {MAX_PER_TURN} per turn ===\n"
    );

    let mut handles = Vec::with_capacity(WORKERS_PER_CLASS * 2);
    for id in 1..=WORKERS_PER_CLASS {
        for class in Class::ALL {
            let lock = Arc::clone(&lock);
            handles.push(
                thread::Builder::new()
                    .name(format!("{class}-{id}"))
                    .spawn(move || worker(&lock, class, id))?,
            );
            thread::sleep(Duration::from_millis(50));
        }
    }

    for handle in handles {
        if handle.join().is_err() {
            return Err("worker panicked".into());
        }
    }

    println!("\n=== all workers finished ===");
    Ok(())
}
