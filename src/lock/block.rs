// SPDX-License-Identifier: MIT OR Apache-2.0
use super::ticket::WaitTicket;
use super::{FairClassLock, log_admission};
use crate::class::Class;
use crate::guard::ClassGuard;
use std::thread;

pub(crate) fn acquire_block(lock: &FairClassLock, class: Class) -> ClassGuard<'_> {
    let mut ticket = WaitTicket::new(lock, class);
    loop {
        // Holding the waiter list across the check means a release either sees our handle or
        // ran its state update before we looked.
        let admission = lock.waiting_sync_threads.with_mut(|threads| {
            let admission = lock.state.with_mut(|state| ticket.poll_admission(state));
            if admission.is_none() {
                threads.push(thread::current());
            }
            admission
        });
        match admission {
            Some(admission) => {
                log_admission(&admission);
                return ticket.into_guard();
            }
            None => thread::park(),
        }
    }
}
