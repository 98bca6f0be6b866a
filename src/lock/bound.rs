// SPDX-License-Identifier: MIT OR Apache-2.0
/// Error returned when a lock is configured with a turn bound of zero.
///
/// # Examples
///
/// ```
/// use fair_class_lock::{FairClassLock, InvalidTurnBound};
///
/// let err = FairClassLock::with_max_per_turn(0).unwrap_err();
/// assert_eq!(err, InvalidTurnBound);
/// assert_eq!(err.to_string(), "max_per_turn must be at least 1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidTurnBound;

impl std::fmt::Display for InvalidTurnBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "max_per_turn must be at least 1")
    }
}

impl std::error::Error for InvalidTurnBound {}
