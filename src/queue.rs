// src/queue.rs
//! Fixed-capacity ring buffer shared by collectors and processors.
//!
//! Every operation takes the same single mutex for its whole body. The non-blocking
//! [`push`](BoundedQueue::push) / [`pop`](BoundedQueue::pop) pair never waits; callers
//! observing a full or empty queue retry. [`push_wait`](BoundedQueue::push_wait),
//! [`push_timeout`](BoundedQueue::push_timeout) and [`pop_wait`](BoundedQueue::pop_wait) park
//! the caller on a condition variable paired with that mutex instead of spinning.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::time::Duration;

struct Ring<T> {
    slots: Vec<Option<T>>,
    size: usize,
    first: usize,
    last: usize,
}

impl<T> Ring<T> {
    #[inline]
    fn is_full(&self) -> bool {
        self.size == self.slots.len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    fn push(&mut self, item: T, mask: usize) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.slots[self.last] = Some(item);
        self.last = (self.last + 1) & mask;
        self.size += 1;
        Ok(())
    }

    #[inline]
    fn pop(&mut self, mask: usize) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.first].take();
        self.first = (self.first + 1) & mask;
        self.size -= 1;
        item
    }
}

/// Bounded multi-producer / multi-consumer FIFO queue.
///
/// The capacity is rounded up to the next power of two so that positions wrap with a mask.
/// The queue is an identity-bound resource: it is neither `Clone` nor `Copy`, share it
/// through an `Arc`.
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    mask: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at least `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                slots,
                size: 0,
                first: 0,
                last: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            mask: capacity - 1,
        }
    }

    #[inline]
    fn ring(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock()
    }

    /// Append `item` at the back of the queue.
    ///
    /// Returns the item back as `Err` when the queue is full, in which case the queue is
    /// left unchanged.
    pub fn push(&self, item: T) -> Result<(), T> {
        let result = self.ring().push(item, self.mask);
        if result.is_ok() {
            self.not_empty.notify_one();
        }
        result
    }

    /// Remove the item at the front of the queue, `None` when the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let item = self.ring().pop(self.mask);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Append `item`, blocking while the queue is full. There is no timeout.
    pub fn push_wait(&self, item: T) {
        let mut ring = self.ring();
        while ring.is_full() {
            self.not_full.wait(&mut ring);
        }
        // Cannot fail: the queue is not full and the lock is held.
        let _ = ring.push(item, self.mask);
        drop(ring);
        self.not_empty.notify_one();
    }

    /// Append `item`, waiting at most `timeout` for room. Returns the item back on timeout.
    pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<(), T> {
        let mut ring = self.ring();
        if ring.is_full() {
            self.not_full.wait_for(&mut ring, timeout);
        }
        let result = ring.push(item, self.mask);
        drop(ring);
        if result.is_ok() {
            self.not_empty.notify_one();
        }
        result
    }

    /// Remove the front item, waiting at most `timeout` for one to show up.
    pub fn pop_wait(&self, timeout: Duration) -> Option<T> {
        let mut ring = self.ring();
        if ring.is_empty() {
            self.not_empty.wait_for(&mut ring, timeout);
        }
        let item = ring.pop(self.mask);
        drop(ring);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    pub fn size(&self) -> usize {
        self.ring().size
    }

    pub fn is_empty(&self) -> bool {
        self.ring().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring().is_full()
    }

    /// The rounded capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: fmt::Display> fmt::Display for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring();
        writeln!(f, "BoundedQueue ({} / {}):", ring.size, self.capacity)?;
        for i in 0..ring.size {
            if let Some(item) = &ring.slots[(ring.first + i) & self.mask] {
                writeln!(f, "- '{}'", item)?;
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("size", &ring.size)
            .field("first", &ring.first)
            .field("last", &ring.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_capacity_rounded_to_power_of_two() {
        assert_eq!(BoundedQueue::<u32>::new(0).capacity(), 1);
        assert_eq!(BoundedQueue::<u32>::new(1).capacity(), 1);
        assert_eq!(BoundedQueue::<u32>::new(5).capacity(), 8);
        assert_eq!(BoundedQueue::<u32>::new(1024).capacity(), 1024);
        assert_eq!(BoundedQueue::<u32>::new(1025).capacity(), 2048);
    }

    #[test]
    fn test_push_fails_exactly_when_full() {
        let queue = BoundedQueue::new(4);
        for i in 0..4 {
            assert!(!queue.is_full());
            assert!(queue.push(i).is_ok());
        }
        assert!(queue.is_full());
        assert_eq!(queue.size(), queue.capacity());
        assert_eq!(queue.push(99), Err(99));
        assert_eq!(queue.size(), 4);
    }

    #[test]
    fn test_pop_fails_exactly_when_empty() {
        let queue: BoundedQueue<String> = BoundedQueue::new(2);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
        queue.push("ACGT".to_string()).unwrap();
        assert!(!queue.is_empty());
        assert_eq!(queue.pop().as_deref(), Some("ACGT"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_order_across_wraparound() {
        let queue = BoundedQueue::new(4);
        let mut expected = Vec::new();
        let mut popped = Vec::new();
        // Interleave to wrap `first` and `last` several times.
        for round in 0..5 {
            for i in 0..3 {
                let value = round * 10 + i;
                queue.push(value).unwrap();
                expected.push(value);
            }
            while let Some(value) = queue.pop() {
                popped.push(value);
            }
        }
        assert_eq!(popped, expected);

        for i in 0..queue.capacity() {
            queue.push(i).unwrap();
        }
        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, (0..queue.capacity()).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_wait_times_out_on_empty_queue() {
        let queue: BoundedQueue<u8> = BoundedQueue::new(2);
        assert_eq!(queue.pop_wait(Duration::from_millis(5)), None);
    }

    #[test]
    fn test_push_timeout_gives_item_back() {
        let queue = BoundedQueue::new(1);
        assert_eq!(queue.push_timeout('a', Duration::from_millis(5)), Ok(()));
        assert_eq!(queue.push_timeout('b', Duration::from_millis(5)), Err('b'));
        assert_eq!(queue.pop(), Some('a'));
    }

    #[test]
    fn test_push_wait_blocks_until_room() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1u32).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push_wait(2))
        };

        // The producer can only finish once the first item left the queue.
        let mut received = Vec::new();
        while received.len() < 2 {
            if let Some(value) = queue.pop_wait(Duration::from_millis(10)) {
                received.push(value);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, vec![1, 2]);
    }

    #[test]
    fn test_pop_wait_woken_by_push() {
        let queue = Arc::new(BoundedQueue::new(2));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let start = Instant::now();
                (queue.pop_wait(Duration::from_secs(30)), start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));
        queue.push(42u32).unwrap();

        let (item, waited) = consumer.join().unwrap();
        assert_eq!(item, Some(42));
        assert!(waited < Duration::from_secs(10), "waited {:?}", waited);
    }

    struct Unprintable;

    impl fmt::Display for Unprintable {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("unprintable item")
        }
    }

    #[test]
    fn test_queue_usable_after_panic_under_lock() {
        let queue = BoundedQueue::new(2);
        queue.push(Unprintable).ok();
        // Panics while the ring mutex is held.
        assert!(panic::catch_unwind(AssertUnwindSafe(|| queue.to_string())).is_err());

        assert_eq!(queue.size(), 1);
        assert!(queue.pop().is_some());
        assert!(queue.push_timeout(Unprintable, Duration::from_millis(5)).is_ok());
        assert!(queue.pop_wait(Duration::from_millis(5)).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_display_lists_items_in_order() {
        let queue = BoundedQueue::new(4);
        queue.push("AC").unwrap();
        queue.push("GT").unwrap();
        let text = queue.to_string();
        assert!(text.starts_with("BoundedQueue (2 / 4):"));
        assert!(text.find("'AC'").unwrap() < text.find("'GT'").unwrap());
    }
}
