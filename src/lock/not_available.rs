// SPDX-License-Identifier: MIT OR Apache-2.0
/// Error returned when the resource cannot be taken immediately.
///
/// This error is returned by [`FairClassLock::try_acquire`](crate::FairClassLock::try_acquire)
/// when the other class holds the resource, or when the caller's class has used up its turn
/// and the other class is waiting.
///
/// # Examples
///
/// ```
/// use fair_class_lock::{Class, FairClassLock, NotAvailable};
///
/// let lock = FairClassLock::default();
/// let _guard = lock.acquire(Class::White);
///
/// match lock.try_acquire(Class::Black) {
///     Ok(_) => panic!("Should not succeed"),
///     Err(NotAvailable) => println!("White holds the resource"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotAvailable;

impl std::fmt::Display for NotAvailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource not available to this class")
    }
}

impl std::error::Error for NotAvailable {}
