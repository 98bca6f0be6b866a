// SPDX-License-Identifier: MIT OR Apache-2.0
use super::FairClassLock;
use crate::class::Class;
use crate::guard::ClassGuard;
use crate::state::{Admission, ClassState};

/// One caller's registration as a waiter.
///
/// Registration happens on the first admission attempt, inside the same critical section.
/// If the ticket is dropped before admission (a cancelled async acquire) the registration is
/// withdrawn and everyone is woken, since one fewer waiter can unblock the other class.
pub(crate) struct WaitTicket<'a> {
    lock: &'a FairClassLock,
    class: Class,
    registered: bool,
    admitted: bool,
}

impl<'a> WaitTicket<'a> {
    pub(crate) fn new(lock: &'a FairClassLock, class: Class) -> Self {
        WaitTicket {
            lock,
            class,
            registered: false,
            admitted: false,
        }
    }

    /// Must be called from inside `lock.state.with_mut`.
    pub(crate) fn poll_admission(&mut self, state: &mut ClassState) -> Option<Admission> {
        if !self.registered {
            state.enqueue(self.class);
            self.registered = true;
        }
        let admission = state.try_admit_waiter(self.class);
        self.admitted = admission.is_some();
        admission
    }

    pub(crate) fn into_guard(self) -> ClassGuard<'a> {
        debug_assert!(self.admitted, "guard for a ticket that was never admitted");
        ClassGuard::new(self.lock, self.class)
    }
}

impl Drop for WaitTicket<'_> {
    fn drop(&mut self) {
        if self.registered && !self.admitted {
            let class = self.class;
            self.lock.state.with_mut(|state| state.withdraw(class));
            log::trace!("{class} waiter withdrew before admission");
            self.lock.notify_all();
        }
    }
}
