// src/sync/spinlock.rs
//! Test-and-set spinlock.
//!
//! Meant for very short, very frequent critical sections (the bookkeeping inside
//! [`RawFairRwLock`](super::RawFairRwLock)), where parking the thread would cost far more
//! than the wait itself.

use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};

/// A spinlock using a single atomic flag (true while held).
#[derive(Debug, Default)]
pub struct Spinlock {
    flag: AtomicBool,
}

impl Spinlock {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Acquire the lock and return a guard releasing it when dropped.
    #[inline]
    pub fn lock(&self) -> SpinlockGuard<'_> {
        self.acquire();
        SpinlockGuard { lock: self }
    }

    /// Try to acquire the lock without waiting.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_>> {
        if self.flag.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(SpinlockGuard { lock: self })
        }
    }

    /// Busy-wait until the flag is acquired.
    ///
    /// Every call must be paired with one [`release`](Self::release); prefer [`lock`](Self::lock).
    pub fn acquire(&self) {
        let backoff = Backoff::new();
        while self.flag.swap(true, Ordering::Acquire) {
            // Only retry the swap once the flag looks free.
            while self.flag.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
    }

    /// Clear the flag.
    #[inline]
    pub fn release(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Scoped holder of a [`Spinlock`]. The lock is released on every exit path of the
/// enclosing scope, unwinding included.
#[must_use = "the spinlock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SpinlockGuard<'a> {
    lock: &'a Spinlock,
}

impl Drop for SpinlockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::UnsafeCell;
    use std::sync::Arc;
    use std::thread;

    struct Counter {
        lock: Spinlock,
        value: UnsafeCell<u64>,
    }

    unsafe impl Sync for Counter {}

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = Spinlock::new();
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
            assert!(lock.try_lock().is_none());
        }
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn early(lock: &Spinlock, bail: bool) -> u32 {
            let _guard = lock.lock();
            if bail {
                return 1;
            }
            2
        }

        let lock = Spinlock::new();
        assert_eq!(early(&lock, true), 1);
        assert!(!lock.is_locked());
        assert_eq!(early(&lock, false), 2);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let lock = Arc::new(Spinlock::new());
        let cloned = Arc::clone(&lock);
        let result = thread::spawn(move || {
            let _guard = cloned.lock();
            panic!("boom");
        })
        .join();
        assert!(result.is_err());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_mutual_exclusion() {
        let counter = Arc::new(Counter {
            lock: Spinlock::new(),
            value: UnsafeCell::new(0),
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        let _guard = counter.lock.lock();
                        unsafe { *counter.value.get() += 1 };
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(unsafe { *counter.value.get() }, 40_000);
    }
}
