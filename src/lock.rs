// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`FairClassLock`] type.
//!
//! # Features
//!
//! - **Two classes**: any number of holders of one [`Class`] at a time, never both.
//! - **Bounded turns**: once the other class is waiting, the running class gets at most
//!   `max_per_turn` admissions before it must hand over.
//! - **No busy waiting**: blocked threads park, blocked tasks await a continuation.
//! - **RAII release**: every acquisition returns a [`ClassGuard`] that releases on drop.
//!
//! See the [`FairClassLock`] struct documentation for usage examples.

use crate::class::Class;
use crate::guard::ClassGuard;
use crate::spinlock::Spinlock;
use crate::state::{Admission, ClassState, Release, Snapshot};
use std::num::NonZeroUsize;
use std::thread;

mod async_impl;
mod block;
mod bound;
mod not_available;
mod ticket;
mod with;

#[cfg(test)]
mod tests;

pub use bound::InvalidTurnBound;
pub use not_available::NotAvailable;

/// The bound used by [`FairClassLock::default`].
pub const DEFAULT_MAX_PER_TURN: NonZeroUsize = NonZeroUsize::MIN.saturating_add(2);

// ================================================================================================
// Main types
// ================================================================================================

/// A resource shared by holders of one class at a time, with bounded turns.
///
/// Threads (or async tasks) of the same [`Class`] may hold the lock together. A holder of the
/// other class has to wait until every current holder has left. To keep a steady stream of one
/// class from locking the other out forever, a class that has been admitted `max_per_turn`
/// times in its turn stops admitting newcomers as soon as the other class has someone waiting;
/// when its last holder leaves, the turn passes to the waiting class.
///
/// The lock protects no data of its own. It only arbitrates who may currently use whatever
/// resource the caller associates with it.
///
/// Acquisition strategies:
/// - **`try_acquire`**: Admits only if the lock would admit right now, never waits
/// - **`acquire`**: Parks the calling thread until admitted
/// - **`acquire_async`**: Awaits admission without blocking the executor
///
/// # Examples
///
/// ## Sharing within a class
///
/// ```
/// use fair_class_lock::{Class, FairClassLock};
///
/// let lock = FairClassLock::default();
///
/// let first = lock.acquire(Class::White);
/// let second = lock.acquire(Class::White);
/// assert_eq!(lock.snapshot().active(Class::White), 2);
///
/// // black has to wait until both white holders are gone
/// assert!(lock.try_acquire(Class::Black).is_err());
/// drop(first);
/// drop(second);
/// assert!(lock.try_acquire(Class::Black).is_ok());
/// ```
///
/// ## Threads of both classes
///
/// ```
/// use fair_class_lock::{Class, FairClassLock};
/// use std::sync::Arc;
/// use std::thread;
///
/// let lock = Arc::new(FairClassLock::with_max_per_turn(2).unwrap());
/// let mut handles = vec![];
///
/// for i in 0..6 {
///     let lock = Arc::clone(&lock);
///     let class = if i % 2 == 0 { Class::White } else { Class::Black };
///     handles.push(thread::spawn(move || {
///         lock.with_sync(class, || {
///             let snapshot = lock.snapshot();
///             assert_eq!(snapshot.active(class.opposite()), 0);
///         });
///     }));
/// }
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert!(lock.snapshot().is_idle());
/// ```
pub struct FairClassLock {
    pub(crate) state: Spinlock<ClassState>,
    pub(crate) waiting_sync_threads: Spinlock<Vec<thread::Thread>>,
    pub(crate) waiting_async_threads: Spinlock<Vec<r#continue::Sender<()>>>,
}

impl FairClassLock {
    /// Creates an idle lock that allows `max_per_turn` admissions per contested turn.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::FairClassLock;
    /// use std::num::NonZeroUsize;
    ///
    /// let lock = FairClassLock::new(NonZeroUsize::new(4).unwrap());
    /// assert_eq!(lock.max_per_turn().get(), 4);
    /// assert!(lock.snapshot().is_idle());
    /// ```
    pub const fn new(max_per_turn: NonZeroUsize) -> Self {
        FairClassLock {
            state: Spinlock::new(ClassState::new(max_per_turn)),
            waiting_sync_threads: Spinlock::new(vec![]),
            waiting_async_threads: Spinlock::new(vec![]),
        }
    }

    /// Creates an idle lock from a plain integer bound.
    ///
    /// Fails with [`InvalidTurnBound`] if `max_per_turn` is zero, since a turn that admits
    /// nobody would never let either class in.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::{FairClassLock, InvalidTurnBound};
    ///
    /// assert!(FairClassLock::with_max_per_turn(1).is_ok());
    /// assert_eq!(FairClassLock::with_max_per_turn(0).unwrap_err(), InvalidTurnBound);
    /// ```
    pub fn with_max_per_turn(max_per_turn: usize) -> Result<Self, InvalidTurnBound> {
        NonZeroUsize::new(max_per_turn)
            .map(FairClassLock::new)
            .ok_or(InvalidTurnBound)
    }

    /// The fairness bound this lock was created with.
    pub fn max_per_turn(&self) -> NonZeroUsize {
        self.snapshot().max_per_turn()
    }

    /// Copies the current counters.
    pub fn snapshot(&self) -> Snapshot {
        self.state.with_mut(|state| state.snapshot())
    }

    /// Attempts to take the resource for `class` without waiting.
    ///
    /// Succeeds exactly when a waiting caller of `class` would be admitted right now. The
    /// attempt is not counted as a waiter, so a failed `try_acquire` has no effect on the
    /// other class.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::{Class, FairClassLock, NotAvailable};
    ///
    /// let lock = FairClassLock::default();
    /// let _black = lock.try_acquire(Class::Black).unwrap();
    ///
    /// assert!(matches!(lock.try_acquire(Class::White), Err(NotAvailable)));
    /// assert!(lock.try_acquire(Class::Black).is_ok());
    /// ```
    pub fn try_acquire(&self, class: Class) -> Result<ClassGuard<'_>, NotAvailable> {
        match self.state.with_mut(|state| state.try_admit_now(class)) {
            Some(admission) => {
                log_admission(&admission);
                Ok(ClassGuard::new(self, class))
            }
            None => Err(NotAvailable),
        }
    }

    /// Takes the resource for `class`, parking the current thread until it is admitted.
    ///
    /// The caller counts as a waiter of `class` from the moment it calls until it is
    /// admitted, which is what makes a running turn of the other class yield. Every release
    /// wakes every parked thread; each re-checks admission and parks again if it still may
    /// not enter.
    ///
    /// There is no timeout. Acquiring twice on the same thread without releasing in between
    /// can deadlock once the other class starts waiting.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::{Class, FairClassLock};
    /// use std::sync::Arc;
    /// use std::thread;
    /// use std::time::Duration;
    ///
    /// let lock = Arc::new(FairClassLock::default());
    /// let white = lock.acquire(Class::White);
    ///
    /// let lock_clone = Arc::clone(&lock);
    /// let black = thread::spawn(move || {
    ///     // parks until the white holder releases
    ///     let guard = lock_clone.acquire(Class::Black);
    ///     guard.class()
    /// });
    ///
    /// thread::sleep(Duration::from_millis(10));
    /// white.release();
    /// assert_eq!(black.join().unwrap(), Class::Black);
    /// ```
    pub fn acquire(&self, class: Class) -> ClassGuard<'_> {
        block::acquire_block(self, class)
    }

    /// Asynchronously takes the resource for `class`.
    ///
    /// Follows the same admission rules as [`acquire`](Self::acquire) but waits on a
    /// continuation instead of parking the thread. Dropping the future before it completes
    /// withdraws the caller from the waiters.
    ///
    /// # Examples
    ///
    /// ```
    /// # test_executors::spin_on(async {
    /// use fair_class_lock::{Class, FairClassLock};
    ///
    /// let lock = FairClassLock::default();
    /// let guard = lock.acquire_async(Class::Black).await;
    /// assert_eq!(lock.snapshot().active(Class::Black), 1);
    /// drop(guard);
    /// # });
    /// ```
    pub async fn acquire_async(&self, class: Class) -> ClassGuard<'_> {
        async_impl::acquire_async(self, class).await
    }

    /// Runs `f` while holding the resource for `class`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::{Class, FairClassLock};
    ///
    /// let lock = FairClassLock::default();
    /// let holders = lock.with_sync(Class::White, || lock.snapshot().active(Class::White));
    /// assert_eq!(holders, 1);
    /// assert!(lock.snapshot().is_idle());
    /// ```
    pub fn with_sync<R, F: FnOnce() -> R>(&self, class: Class, f: F) -> R {
        with::with_sync(self, class, f)
    }

    /// Runs `f` while holding the resource for `class`, acquiring asynchronously.
    ///
    /// # Examples
    ///
    /// ```
    /// # test_executors::spin_on(async {
    /// use fair_class_lock::{Class, FairClassLock};
    ///
    /// let lock = FairClassLock::default();
    /// let turn = lock.with_async(Class::Black, || lock.snapshot().turn()).await;
    /// assert_eq!(turn, Some(Class::Black));
    /// # });
    /// ```
    pub async fn with_async<R, F: FnOnce() -> R>(&self, class: Class, f: F) -> R {
        with::with_async(self, class, f).await
    }

    /// Drops one holder of `class` and wakes every waiter.
    ///
    /// Only reachable through [`ClassGuard`], so every release matches an admission.
    pub(crate) fn release(&self, class: Class) {
        match self.state.with_mut(|state| state.release(class)) {
            Release::Continuing { remaining } => {
                log::trace!("{class} released, {remaining} {class} still active");
            }
            Release::HandedOff { to } => {
                log::debug!("last {class} holder released, turn handed to {to}");
            }
            Release::Cleared => {
                log::trace!("last {class} holder released, turn cleared");
            }
        }
        self.notify_all();
    }

    /// Wakes every parked thread and every pending async waiter.
    ///
    /// Always all of them: a single release can make waiters of either class admissible, and
    /// only the predicate knows which.
    pub(crate) fn notify_all(&self) {
        let threads = self.waiting_sync_threads.with_mut(std::mem::take);
        for thread in threads {
            thread.unpark();
        }
        let senders = self.waiting_async_threads.with_mut(std::mem::take);
        for sender in senders {
            sender.send(());
        }
    }
}

pub(crate) fn log_admission(admission: &Admission) {
    if admission.new_turn {
        log::debug!("{} turn begins", admission.class);
    }
    log::trace!(
        "{} admitted ({} active, admission {} of this turn)",
        admission.class,
        admission.active,
        admission.turn_count
    );
}

// Boilerplate trait implementations for FairClassLock
impl Default for FairClassLock {
    /// Creates an idle lock with [`DEFAULT_MAX_PER_TURN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::FairClassLock;
    ///
    /// let lock = FairClassLock::default();
    /// assert_eq!(lock.max_per_turn().get(), 3);
    /// ```
    fn default() -> Self {
        FairClassLock::new(DEFAULT_MAX_PER_TURN)
    }
}

impl std::fmt::Debug for FairClassLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FairClassLock")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for FairClassLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.snapshot(), f)
    }
}

impl From<NonZeroUsize> for FairClassLock {
    fn from(max_per_turn: NonZeroUsize) -> Self {
        FairClassLock::new(max_per_turn)
    }
}
