// SPDX-License-Identifier: MIT OR Apache-2.0
use super::ticket::WaitTicket;
use super::{FairClassLock, log_admission};
use crate::class::Class;
use crate::guard::ClassGuard;

pub(crate) async fn acquire_async(lock: &FairClassLock, class: Class) -> ClassGuard<'_> {
    let mut ticket = WaitTicket::new(lock, class);
    loop {
        let a = lock.waiting_async_threads.with_mut(|senders| {
            match lock.state.with_mut(|state| ticket.poll_admission(state)) {
                Some(admission) => Ok(admission),
                None => {
                    // Create a new channel to signal when a release happens
                    let (sender, receiver) = r#continue::continuation();
                    senders.push(sender);
                    Err(receiver)
                }
            }
        });
        match a {
            Ok(admission) => {
                log_admission(&admission);
                return ticket.into_guard();
            }
            Err(receiver) => {
                receiver.await;
            }
        }
    }
}
