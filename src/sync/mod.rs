//! Synchronization primitives - spinlock and fair multiple-reader / single-writer lock

pub mod rw_lock;
pub mod spinlock;

pub use rw_lock::{FairReadGuard, FairRwLock, FairWriteGuard, RawFairRwLock};
pub use spinlock::{Spinlock, SpinlockGuard};
