// src/sync/rw_lock.rs
//! Multiple-reader / single-writer lock balancing readers and writers.
//!
//! The lock is not lock-free: readers wait for the active writer and writers wait for the
//! active readers. Before competing for the internal [`Spinlock`], a requester yields
//! priority to the other class while that class has strictly more pending requests.
//! Both counters are read independently, so this approximates fairness; it is not a
//! bounded-wait guarantee.
//!
//! The index holds one lock per shard: the state stays a few unpadded atomics.

use super::Spinlock;
use crossbeam::utils::Backoff;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The bare lock state, without any protected data.
///
/// The four request/release methods must be called in matching pairs. [`FairRwLock`]
/// does that through guards and is what the index uses.
#[derive(Default)]
pub struct RawFairRwLock {
    /// Serializes the transition of a pending request to an active one.
    mutex: Spinlock,
    /// True while a writer holds the lock.
    writer: AtomicBool,
    readers: AtomicUsize,
    pending_readers: AtomicUsize,
    pending_writers: AtomicUsize,
}

impl RawFairRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register as a pending reader, then become an active reader once no writer is active.
    pub fn request_read_access(&self) {
        self.pending_readers.fetch_add(1, Ordering::SeqCst);

        let backoff = Backoff::new();
        // Pending writers go first while they are the most abundant.
        while self.pending_writers.load(Ordering::SeqCst) > self.pending_readers.load(Ordering::SeqCst) {
            backoff.snooze();
        }

        let _guard = self.mutex.lock();
        backoff.reset();
        while self.writer.load(Ordering::Acquire) {
            backoff.snooze();
        }
        self.readers.fetch_add(1, Ordering::SeqCst);
        let previous = self.pending_readers.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "a reader must be pending before becoming active");
    }

    /// Leave the active readers.
    pub fn release_read_access(&self) {
        let previous = self.readers.fetch_sub(1, Ordering::Release);
        debug_assert!(previous > 0, "releasing a read access that was never granted");
    }

    /// Register as a pending writer, then take the lock once every active reader is gone.
    pub fn request_write_access(&self) {
        self.pending_writers.fetch_add(1, Ordering::SeqCst);

        let backoff = Backoff::new();
        // Pending readers go first while they are the most abundant.
        while self.pending_readers.load(Ordering::SeqCst) > self.pending_writers.load(Ordering::SeqCst) {
            backoff.snooze();
        }

        let _guard = self.mutex.lock();
        backoff.reset();
        while self.readers.load(Ordering::Acquire) > 0 {
            backoff.snooze();
        }
        while self.writer.swap(true, Ordering::Acquire) {
            backoff.snooze();
        }
        let previous = self.pending_writers.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "a writer must be pending before becoming active");
    }

    /// Clear the writer flag.
    pub fn release_write_access(&self) {
        debug_assert!(self.writer.load(Ordering::Relaxed), "releasing a write access that was never granted");
        self.writer.store(false, Ordering::Release);
    }

    pub fn active_readers(&self) -> usize {
        self.readers.load(Ordering::Relaxed)
    }

    pub fn pending_readers(&self) -> usize {
        self.pending_readers.load(Ordering::Relaxed)
    }

    pub fn pending_writers(&self) -> usize {
        self.pending_writers.load(Ordering::Relaxed)
    }

    pub fn is_write_locked(&self) -> bool {
        self.writer.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for RawFairRwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFairRwLock")
            .field("writer", &self.is_write_locked())
            .field("readers", &self.active_readers())
            .field("pending_readers", &self.pending_readers())
            .field("pending_writers", &self.pending_writers())
            .finish()
    }
}

/// A value protected by a [`RawFairRwLock`].
pub struct FairRwLock<T> {
    raw: RawFairRwLock,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is mediated by `raw`: shared references only exist while a read
// access is held, the exclusive reference only while the write access is held.
unsafe impl<T: Send> Send for FairRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for FairRwLock<T> {}

impl<T> FairRwLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            raw: RawFairRwLock::new(),
            data: UnsafeCell::new(value),
        }
    }

    pub fn read(&self) -> FairReadGuard<'_, T> {
        self.raw.request_read_access();
        FairReadGuard { lock: self }
    }

    pub fn write(&self) -> FairWriteGuard<'_, T> {
        self.raw.request_write_access();
        FairWriteGuard { lock: self }
    }

    /// Direct access; the exclusive borrow already rules out any other holder.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    pub fn raw(&self) -> &RawFairRwLock {
        &self.raw
    }
}

impl<T: Default> Default for FairRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for FairRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read();
        f.debug_struct("FairRwLock").field("data", &*guard).finish()
    }
}

#[must_use = "the read access is released as soon as the guard is dropped"]
pub struct FairReadGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for FairReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a read access is held for the guard's lifetime, so no writer is active.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for FairReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_read_access();
    }
}

#[must_use = "the write access is released as soon as the guard is dropped"]
pub struct FairWriteGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for FairWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the write access is held for the guard's lifetime.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for FairWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the write access is exclusive for the guard's lifetime.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for FairWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_write_access();
    }
}
