// SPDX-License-Identifier: MIT OR Apache-2.0
use super::FairClassLock;
use crate::class::Class;

pub(crate) fn with_sync<R, F: FnOnce() -> R>(lock: &FairClassLock, class: Class, f: F) -> R {
    let _guard = lock.acquire(class);
    f()
}

pub(crate) async fn with_async<R, F: FnOnce() -> R>(
    lock: &FairClassLock,
    class: Class,
    f: F,
) -> R {
    let _guard = lock.acquire_async(class).await;
    f()
}
