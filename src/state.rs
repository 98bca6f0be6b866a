// SPDX-License-Identifier: MIT OR Apache-2.0
//! Turn bookkeeping and the admission predicate.
//!
//! [`ClassState`] holds every counter a [`FairClassLock`](crate::FairClassLock) needs and
//! implements the transitions between them. It does no synchronization of its own: the lock
//! keeps it behind a single [`Spinlock`](crate::spinlock::Spinlock) and only ever touches it
//! inside `with_mut`.
//!
//! # Fairness
//!
//! A class may keep admitting new holders for as long as the other class has nobody waiting.
//! Once the other class has a waiter, the running class gets at most `max_per_turn` admissions
//! in its turn. When its last holder leaves, the turn is handed to the waiting class before any
//! of that class has actually been admitted, so a late arrival of the old class cannot slip in
//! ahead of it.

use crate::class::Class;
use std::num::NonZeroUsize;


/// Counters and turn state shared by all holders and waiters of one lock.
#[derive(Debug, Clone)]
pub(crate) struct ClassState {
    active: [usize; 2],
    waiting: [usize; 2],
    turn: Option<Class>,
    turn_count: usize,
    max_per_turn: NonZeroUsize,
}

/// What an admission did to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Admission {
    pub(crate) class: Class,
    /// Holders of `class` after this admission.
    pub(crate) active: usize,
    /// Admissions granted in the current turn, including this one.
    pub(crate) turn_count: usize,
    /// Whether this admission started a new turn.
    pub(crate) new_turn: bool,
}

/// What a release did to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// Other holders of the releasing class remain.
    Continuing { remaining: usize },
    /// The last holder left and the turn passed to the waiting class.
    HandedOff { to: Class },
    /// The last holder left and nobody of the other class was waiting.
    Cleared,
}

impl ClassState {
    pub(crate) const fn new(max_per_turn: NonZeroUsize) -> Self {
        ClassState {
            active: [0; 2],
            waiting: [0; 2],
            turn: None,
            turn_count: 0,
            max_per_turn,
        }
    }

    fn is_idle(&self) -> bool {
        self.active[0] == 0 && self.active[1] == 0
    }

    /// Decides whether a caller of `class` may take the resource right now.
    pub(crate) fn can_access(&self, class: Class) -> bool {
        let other = class.opposite();
        if self.active[other.index()] > 0 {
            return false;
        }
        let other_waiting = self.waiting[other.index()];
        if self.is_idle() {
            return match self.turn {
                None => true,
                Some(turn) if turn == class => true,
                // privileged class has nobody left to admit
                Some(_) => other_waiting == 0,
            };
        }
        // active, and necessarily by `class`
        !(self.turn_count >= self.max_per_turn.get() && other_waiting > 0)
    }

    /// Registers a caller of `class` as waiting.
    pub(crate) fn enqueue(&mut self, class: Class) {
        self.waiting[class.index()] += 1;
    }

    /// Removes a registered caller that gave up before being admitted.
    pub(crate) fn withdraw(&mut self, class: Class) {
        debug_assert!(self.waiting[class.index()] > 0, "withdraw without enqueue");
        self.waiting[class.index()] -= 1;
    }

    /// Admits a registered waiter if the predicate allows it.
    pub(crate) fn try_admit_waiter(&mut self, class: Class) -> Option<Admission> {
        if !self.can_access(class) {
            return None;
        }
        debug_assert!(self.waiting[class.index()] > 0, "admitting an unregistered waiter");
        self.waiting[class.index()] -= 1;
        Some(self.admit(class))
    }

    /// Admits a caller that never registered as waiting, if the predicate allows it.
    pub(crate) fn try_admit_now(&mut self, class: Class) -> Option<Admission> {
        if !self.can_access(class) {
            return None;
        }
        Some(self.admit(class))
    }

    fn admit(&mut self, class: Class) -> Admission {
        self.active[class.index()] += 1;
        // a handed-off turn starts with its first admission
        let new_turn = self.turn != Some(class) || self.turn_count == 0;
        if new_turn {
            self.turn = Some(class);
            self.turn_count = 1;
        } else {
            self.turn_count += 1;
        }
        Admission {
            class,
            active: self.active[class.index()],
            turn_count: self.turn_count,
            new_turn,
        }
    }

    /// Drops one holder of `class`.
    pub(crate) fn release(&mut self, class: Class) -> Release {
        debug_assert!(self.active[class.index()] > 0, "release without a holder");
        self.active[class.index()] -= 1;
        let remaining = self.active[class.index()];
        if remaining > 0 {
            return Release::Continuing { remaining };
        }
        let other = class.opposite();
        if self.waiting[other.index()] > 0 {
            self.turn = Some(other);
            self.turn_count = 0;
            Release::HandedOff { to: other }
        } else {
            self.turn = None;
            Release::Cleared
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.active,
            waiting: self.waiting,
            turn: self.turn,
            turn_count: self.turn_count,
            max_per_turn: self.max_per_turn,
        }
    }
}

/// A point-in-time copy of a lock's counters.
///
/// Taken atomically with respect to every admission and release, but stale as soon as it is
/// returned. Useful for diagnostics and for tests that need to wait until a thread is blocked.
///
/// # Examples
///
/// ```
/// use fair_class_lock::{Class, FairClassLock};
///
/// let lock = FairClassLock::default();
/// let guard = lock.acquire(Class::White);
///
/// let snapshot = lock.snapshot();
/// assert_eq!(snapshot.active(Class::White), 1);
/// assert_eq!(snapshot.turn(), Some(Class::White));
/// assert_eq!(snapshot.turn_count(), 1);
/// drop(guard);
///
/// assert!(lock.snapshot().is_idle());
/// assert_eq!(lock.snapshot().turn(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snapshot {
    active: [usize; 2],
    waiting: [usize; 2],
    turn: Option<Class>,
    turn_count: usize,
    max_per_turn: NonZeroUsize,
}

impl Snapshot {
    /// Number of holders of `class`.
    pub fn active(&self, class: Class) -> usize {
        self.active[class.index()]
    }

    /// Number of callers of `class` blocked waiting for admission.
    pub fn waiting(&self, class: Class) -> usize {
        self.waiting[class.index()]
    }

    /// The class currently privileged to extend its run, if any.
    pub fn turn(&self) -> Option<Class> {
        self.turn
    }

    /// Admissions granted in the current turn. Zero right after a handoff.
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Admissions a class may take in a turn while the other class waits.
    pub fn max_per_turn(&self) -> NonZeroUsize {
        self.max_per_turn
    }

    /// `true` if nobody holds the resource.
    pub fn is_idle(&self) -> bool {
        self.active == [0, 0]
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "white: {} active / {} waiting, black: {} active / {} waiting, ",
            self.active[0], self.waiting[0], self.active[1], self.waiting[1]
        )?;
        match self.turn {
            Some(turn) => write!(
                f,
                "turn: {turn} ({}/{})",
                self.turn_count, self.max_per_turn
            ),
            None => write!(f, "turn: none"),
        }
    }
}
