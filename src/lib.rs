// SPDX-License-Identifier: MIT OR Apache-2.0
//! A lock shared by two classes of threads, fair between the classes.
//!
//! # The Core Problem
//!
//! Some resources can be used by many parties at once, as long as they are all of the same
//! kind: readers and writers, two directions of traffic over a single-lane bridge, two kinds of
//! jobs that may not mix. A plain readers/writers lock lets one side starve the other. As long
//! as a new reader shows up before the last one leaves, a writer never gets in.
//!
//! # The Solution
//!
//! [`FairClassLock`] admits any number of holders of one [`Class`] at a time and never holders
//! of both. It tracks whose turn it is and how many admissions that turn has had. A class with
//! no competition runs for as long as it likes. Once the other class has a waiter, the running
//! class may admit only up to `max_per_turn` holders in its turn, and when its last holder
//! leaves the turn passes to the class that was waiting.
//!
//! - **Blocking**: [`FairClassLock::acquire`] parks the thread until admitted
//! - **Async**: [`FairClassLock::acquire_async`] awaits admission
//! - **Non-blocking**: [`FairClassLock::try_acquire`] admits only if it can right now
//! - **Scoped**: every acquisition returns a [`ClassGuard`] that releases on drop
//!
//! Each lock is an ordinary value. Share it with `Arc` or a reference; independent locks
//! never interact.
//!
//! # Examples
//!
//! ```
//! use fair_class_lock::{Class, FairClassLock};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let lock = Arc::new(FairClassLock::with_max_per_turn(3).unwrap());
//!
//! let handles: Vec<_> = (0..10)
//!     .map(|i| {
//!         let lock = Arc::clone(&lock);
//!         let class = if i % 2 == 0 { Class::White } else { Class::Black };
//!         thread::spawn(move || {
//!             let guard = lock.acquire(class);
//!             // only holders of `class` are inside
//!             assert_eq!(lock.snapshot().active(class.opposite()), 0);
//!             drop(guard);
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert!(lock.snapshot().is_idle());
//! ```
//!
//! # Logging
//!
//! Admissions and releases are reported through the [`log`](https://docs.rs/log) facade:
//! turn changes at `debug`, every admission and release at `trace`.

mod class;
mod guard;
mod lock;
pub(crate) mod spinlock;
mod state;

pub use class::Class;
pub use guard::ClassGuard;
pub use lock::{DEFAULT_MAX_PER_TURN, FairClassLock, InvalidTurnBound, NotAvailable};
pub use state::Snapshot;
