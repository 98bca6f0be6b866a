// SPDX-License-Identifier: MIT OR Apache-2.0
//! The guard type returned by every successful acquisition.

use crate::class::Class;
use crate::lock::FairClassLock;

/// A hold on a [`FairClassLock`] for one [`Class`].
///
/// This guard is created by the acquisition methods on [`FairClassLock`]. When the guard is
/// dropped, the hold is released and every waiter is woken to re-check whether it may enter.
///
/// # RAII Pattern
///
/// The hold is taken when the guard is created and released when the guard is dropped, so it
/// is released on every exit path, including early returns and panics. Call
/// [`release`](Self::release) (or `drop`) to give it up early.
///
/// # Examples
///
/// ```
/// use fair_class_lock::{Class, FairClassLock};
///
/// let lock = FairClassLock::default();
///
/// let guard = lock.acquire(Class::Black);
/// assert_eq!(guard.class(), Class::Black);
/// assert!(lock.try_acquire(Class::White).is_err());
///
/// guard.release();
/// assert!(lock.try_acquire(Class::White).is_ok());
/// ```
#[must_use = "if unused the hold is released immediately"]
pub struct ClassGuard<'a> {
    lock: &'a FairClassLock,
    class: Class,
}

impl<'a> ClassGuard<'a> {
    pub(crate) fn new(lock: &'a FairClassLock, class: Class) -> Self {
        ClassGuard { lock, class }
    }

    /// The class this hold was granted for.
    pub fn class(&self) -> Class {
        self.class
    }

    /// The lock this hold belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use fair_class_lock::{Class, FairClassLock};
    ///
    /// let lock = FairClassLock::default();
    /// let guard = lock.acquire(Class::White);
    /// assert!(std::ptr::eq(guard.lock(), &lock));
    /// assert_eq!(guard.lock().snapshot().active(Class::White), 1);
    /// ```
    pub fn lock(&self) -> &'a FairClassLock {
        self.lock
    }

    /// Releases the hold now. Equivalent to dropping the guard.
    pub fn release(self) {
        drop(self)
    }
}

impl Drop for ClassGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.class);
    }
}

// ================================================================================================
// Boilerplate trait implementations
// ================================================================================================

impl std::fmt::Debug for ClassGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassGuard")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
