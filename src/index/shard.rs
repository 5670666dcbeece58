// src/index/shard.rs
use crate::sync::{FairReadGuard, FairRwLock};
use std::collections::BTreeSet;

/// One partition of the index: the ordered suffix codes sharing an encoded prefix.
#[derive(Debug, Default)]
pub struct Shard {
    suffixes: FairRwLock<BTreeSet<u64>>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the write lock. Returns false if the code was already present.
    pub fn insert(&self, suffix: u64) -> bool {
        self.suffixes.write().insert(suffix)
    }

    pub fn contains(&self, suffix: u64) -> bool {
        self.suffixes.read().contains(&suffix)
    }

    pub fn size(&self) -> usize {
        self.suffixes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Read access to the codes; writers to this shard wait until the guard is dropped.
    pub fn read(&self) -> FairReadGuard<'_, BTreeSet<u64>> {
        self.suffixes.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_is_idempotent() {
        let shard = Shard::new();
        assert!(shard.is_empty());
        assert!(shard.insert(39));
        assert!(!shard.insert(39));
        assert!(shard.insert(1));
        assert_eq!(shard.size(), 2);
        assert!(shard.contains(39));
        assert!(!shard.contains(40));
        assert_eq!(shard.read().iter().copied().collect::<Vec<_>>(), vec![1, 39]);
    }

    #[test]
    fn test_shard_header_stays_small() {
        // 4^prefix_length shards are allocated up front.
        assert!(std::mem::size_of::<Shard>() <= 96, "{} bytes", std::mem::size_of::<Shard>());
        let shards: Vec<Shard> = (0..1 << 10).map(|_| Shard::new()).collect();
        assert!(std::mem::size_of_val(shards.as_slice()) <= 96 << 10);
    }

    #[test]
    fn test_concurrent_overlapping_inserts() {
        let shard = Arc::new(Shard::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shard = Arc::clone(&shard);
                // Each thread covers [t * 500, t * 500 + 1000): neighbours overlap by half.
                thread::spawn(move || (0..1000u64).filter(|i| shard.insert(t * 500 + i)).count())
            })
            .collect();
        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 2500);
        assert_eq!(shard.size(), 2500);
    }
}
