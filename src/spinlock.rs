// SPDX-License-Identifier: MIT OR Apache-2.0
//! A spinlock for the short critical sections inside [`FairClassLock`](crate::FairClassLock).
//!
//! Every section guarded here is a few integer updates or a `Vec` push/take, so spinning is
//! cheaper than parking. Callers that actually wait for the resource park or await instead;
//! they never spin on this lock for longer than one of those sections.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// A spinlock whose data is only reachable through [`with_mut`](Self::with_mut).
#[derive(Debug)]
pub(crate) struct Spinlock<T> {
    data: UnsafeCell<T>,
    locked: AtomicBool,
}

/// Clears the lock flag on scope exit, including when the closure unwinds.
struct Unlock<'a>(&'a AtomicBool);

impl Drop for Unlock<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T> Spinlock<T> {
    pub(crate) const fn new(data: T) -> Self {
        Spinlock {
            data: UnsafeCell::new(data),
            locked: AtomicBool::new(false),
        }
    }

    /// Runs `f` with exclusive access to the protected data.
    ///
    /// Not reentrant: calling `with_mut` on the same spinlock from inside `f` deadlocks.
    pub(crate) fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
        let _unlock = Unlock(&self.locked);
        // SAFETY: the flag was false and we set it, so no other caller is inside `with_mut`
        unsafe { f(&mut *self.data.get()) }
    }
}

unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T: Default> Default for Spinlock<T> {
    fn default() -> Self {
        Spinlock::new(T::default())
    }
}
