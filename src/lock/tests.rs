// SPDX-License-Identifier: MIT OR Apache-2.0
use super::*;
use crate::class::Class::{Black, White};
use r#continue::continuation;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

fn lock(max_per_turn: usize) -> Arc<FairClassLock> {
    Arc::new(FairClassLock::with_max_per_turn(max_per_turn).unwrap())
}

/// Polls the lock's counters until `ready` holds, so a test can be sure a thread is parked.
fn wait_until(lock: &FairClassLock, ready: impl Fn(&Snapshot) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let snapshot = lock.snapshot();
        if ready(&snapshot) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting; state: {snapshot}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Spawns a worker that records its class while holding the lock for `hold`.
fn spawn_worker(
    lock: &Arc<FairClassLock>,
    class: Class,
    hold: Duration,
    order: &Arc<std::sync::Mutex<Vec<Class>>>,
) -> thread::JoinHandle<()> {
    let lock = Arc::clone(lock);
    let order = Arc::clone(order);
    thread::Builder::new()
        .name(format!("{class} worker"))
        .spawn(move || {
            let guard = lock.acquire(class);
            order.lock().unwrap().push(class);
            thread::sleep(hold);
            drop(guard);
        })
        .unwrap()
}

#[test]
fn test_acquire_uncontested() {
    let lock = lock(3);
    let guard = lock.acquire(White);
    let snapshot = lock.snapshot();
    assert_eq!(snapshot.active(White), 1);
    assert_eq!(snapshot.waiting(White), 0);
    assert_eq!(snapshot.turn(), Some(White));
    drop(guard);

    let snapshot = lock.snapshot();
    assert!(snapshot.is_idle());
    assert_eq!(snapshot.turn(), None);
}

#[test]
fn test_try_acquire_contention() {
    let lock = lock(3);
    let white = lock.try_acquire(White).unwrap();
    assert_eq!(lock.try_acquire(Black).unwrap_err(), NotAvailable);
    let second = lock.try_acquire(White).unwrap();
    assert_eq!(lock.snapshot().active(White), 2);
    // a failed attempt never registers as waiting
    assert_eq!(lock.snapshot().waiting(Black), 0);
    drop(white);
    drop(second);
    assert!(lock.try_acquire(Black).is_ok());
}

#[test]
fn test_acquire_blocks_until_other_class_leaves() {
    let lock = lock(3);
    let white = lock.acquire(White);

    let (tx, rx) = mpsc::channel();
    let lock_clone = Arc::clone(&lock);
    thread::spawn(move || {
        let guard = lock_clone.acquire(Black);
        tx.send(guard.class()).unwrap();
    });

    wait_until(&lock, |s| s.waiting(Black) == 1);
    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());

    white.release();
    assert_eq!(rx.recv().unwrap(), Black);
    wait_until(&lock, |s| s.is_idle());
    assert_eq!(lock.snapshot().turn(), None);
}

#[test]
fn test_exhausted_turn_hands_off_to_waiting_class() {
    let lock = lock(3);
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let first = lock.acquire(White);
    let black = spawn_worker(&lock, Black, Duration::from_millis(5), &order);
    wait_until(&lock, |s| s.waiting(Black) == 1);

    // white may still fill its turn while black waits
    let second = lock.try_acquire(White).unwrap();
    let third = lock.try_acquire(White).unwrap();
    assert_eq!(lock.snapshot().turn_count(), 3);
    assert!(lock.try_acquire(White).is_err());

    let late_white = spawn_worker(&lock, White, Duration::ZERO, &order);
    wait_until(&lock, |s| s.waiting(White) == 1);

    drop(first);
    drop(second);
    third.release();

    black.join().unwrap();
    late_white.join().unwrap();
    assert_eq!(*order.lock().unwrap(), vec![Black, White]);
}

#[test]
fn test_alternation_with_bound_of_one() {
    let lock = lock(1);
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let opener = lock.acquire(White);
    let mut workers = vec![
        spawn_worker(&lock, Black, Duration::from_millis(5), &order),
        spawn_worker(&lock, Black, Duration::from_millis(5), &order),
    ];
    wait_until(&lock, |s| s.waiting(Black) == 2);
    workers.push(spawn_worker(&lock, White, Duration::from_millis(5), &order));
    workers.push(spawn_worker(&lock, White, Duration::from_millis(5), &order));
    wait_until(&lock, |s| s.waiting(White) == 2);

    drop(opener);
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![Black, White, Black, White]);
    assert_eq!(lock.snapshot().turn(), None);
}

#[test]
fn test_uncontested_class_shares_freely() {
    // with nobody of the other class around, the bound never applies
    const THREADS: usize = 8;
    let lock = lock(1);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _guard = lock.acquire(White);
                // only returns once every thread holds the lock at the same time
                barrier.wait();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(lock.snapshot().is_idle());
}

#[test]
fn test_mutual_exclusion_under_contention() {
    const PER_CLASS: usize = 4;
    const ROUNDS: usize = 200;
    let lock = lock(2);
    let inside = Arc::new([AtomicUsize::new(0), AtomicUsize::new(0)]);

    let handles: Vec<_> = Class::ALL
        .into_iter()
        .flat_map(|class| std::iter::repeat_n(class, PER_CLASS))
        .map(|class| {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let guard = lock.acquire(class);
                    inside[class.index()].fetch_add(1, Ordering::SeqCst);
                    assert_eq!(inside[class.opposite().index()].load(Ordering::SeqCst), 0);
                    thread::yield_now();
                    inside[class.index()].fetch_sub(1, Ordering::SeqCst);
                    drop(guard);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = lock.snapshot();
    assert!(snapshot.is_idle());
    assert_eq!(snapshot.waiting(White), 0);
    assert_eq!(snapshot.waiting(Black), 0);
    assert_eq!(snapshot.turn(), None);
}

#[test]
fn test_guard_released_on_panic() {
    let lock = lock(3);
    let lock_clone = Arc::clone(&lock);
    let result = thread::spawn(move || {
        let _guard = lock_clone.acquire(Black);
        if lock_clone.snapshot().active(Black) == 1 {
            panic!("worker failed while holding the lock");
        }
    })
    .join();
    assert!(result.is_err());
    assert!(lock.snapshot().is_idle());
    assert!(lock.try_acquire(White).is_ok());
}

#[test]
fn test_with_sync_releases_after_closure() {
    let lock = lock(3);
    let value = lock.with_sync(Black, || {
        assert!(lock.try_acquire(White).is_err());
        42
    });
    assert_eq!(value, 42);
    assert!(lock.snapshot().is_idle());
}

#[test]
fn test_construction() {
    assert_eq!(FairClassLock::with_max_per_turn(0).unwrap_err(), InvalidTurnBound);
    assert_eq!(FairClassLock::default().max_per_turn(), DEFAULT_MAX_PER_TURN);
    assert_eq!(DEFAULT_MAX_PER_TURN.get(), 3);

    let lock = FairClassLock::from(NonZeroUsize::new(7).unwrap());
    assert_eq!(lock.max_per_turn().get(), 7);
    assert_eq!(
        lock.to_string(),
        "white: 0 active / 0 waiting, black: 0 active / 0 waiting, turn: none"
    );
}

#[test_executors::async_test]
async fn test_acquire_async_uncontested() {
    let lock = lock(2);
    let guard = lock.acquire_async(White).await;
    assert_eq!(lock.snapshot().active(White), 1);
    drop(guard);
    let turn = lock.with_async(Black, || lock.snapshot().turn()).await;
    assert_eq!(turn, Some(Black));
    assert!(lock.snapshot().is_idle());
}

#[test_executors::async_test]
async fn test_acquire_async_waits_for_release() {
    let lock = lock(2);
    let black = lock.acquire(Black);

    let (c, r) = continuation();
    let lock_clone = Arc::clone(&lock);
    thread::spawn(move || {
        let class = test_executors::spin_on(async {
            let guard = lock_clone.acquire_async(White).await;
            guard.class()
        });
        c.send(class);
    });

    wait_until(&lock, |s| s.waiting(White) == 1);
    drop(black);
    assert_eq!(r.await, White);
    assert!(lock.snapshot().is_idle());
}

#[test]
fn test_cancelled_async_waiter_is_withdrawn() {
    let lock = lock(1);
    let white = lock.acquire(White);

    {
        let mut pending = pin!(lock.acquire_async(Black));
        let mut cx = Context::from_waker(Waker::noop());
        assert!(pending.as_mut().poll(&mut cx).is_pending());
        assert_eq!(lock.snapshot().waiting(Black), 1);

        // the turn is handed to black, which is still only waiting
        drop(white);
        let snapshot = lock.snapshot();
        assert_eq!(snapshot.turn(), Some(Black));
        assert_eq!(snapshot.turn_count(), 0);
    }

    // the black waiter gave up; the idle lock must not stall white
    let snapshot = lock.snapshot();
    assert_eq!(snapshot.waiting(Black), 0);
    assert_eq!(snapshot.turn(), Some(Black));
    let white = lock.try_acquire(White).unwrap();
    assert_eq!(lock.snapshot().turn(), Some(White));
    drop(white);
}

#[test]
fn test_cancelled_async_waiter_unblocks_exhausted_turn() {
    let lock = lock(1);
    let first = lock.acquire(White);

    let mut pending = Box::pin(lock.acquire_async(Black));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(matches!(pending.as_mut().poll(&mut cx), Poll::Pending));

    // white's turn is used up while black waits
    let (tx, rx) = mpsc::channel();
    let lock_clone = Arc::clone(&lock);
    thread::spawn(move || {
        let _guard = lock_clone.acquire(White);
        tx.send(()).unwrap();
    });
    wait_until(&lock, |s| s.waiting(White) == 1);
    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());

    // withdrawing black wakes the parked white thread
    drop(pending);
    rx.recv().unwrap();
    drop(first);
    wait_until(&lock, |s| s.is_idle());
}

#[test]
fn test_first_admission_after_handoff_starts_turn() {
    let lock = lock(2);
    let white = lock.acquire(White);
    lock.state.with_mut(|state| state.enqueue(Black));

    drop(white);
    let snapshot = lock.snapshot();
    assert_eq!(snapshot.turn(), Some(Black));
    assert_eq!(snapshot.turn_count(), 0);
    assert_eq!(snapshot.max_per_turn().get(), 2);

    let first = lock
        .state
        .with_mut(|state| state.try_admit_waiter(Black))
        .unwrap();
    assert!(first.new_turn);
    assert_eq!(first.turn_count, 1);
    let black = ClassGuard::new(&lock, Black);

    let second = lock.try_acquire(Black).unwrap();
    assert_eq!(lock.snapshot().turn_count(), 2);
    assert!(std::ptr::eq(second.lock(), black.lock()));
    drop(second);
    drop(black);
    assert!(lock.snapshot().is_idle());
}
