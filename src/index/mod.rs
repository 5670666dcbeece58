//! Prefix-sharded k-mer index
//!
//! The index holds `4^prefix_length` shards. A k-mer is encoded by the transformer; its
//! encoded prefix selects the shard and its encoded suffix is the value stored there, so two
//! k-mers with different prefixes never contend for the same lock.

pub mod shard;
pub mod stats;

pub use shard::Shard;
pub use stats::{label_name, statistics_from_sizes};

use crate::error::{ConfigurationError, Result};
use crate::pipeline::KmerSink;
use crate::settings::Settings;
use crate::transform::{EncodedKmer, KmerLayout, Transformer};
use crossbeam::utils::CachePadded;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Default number of statistics bins
pub const DEFAULT_NB_BINS: usize = 100;

pub struct ShardedIndex {
    shards: Box<[Shard]>,
    size: CachePadded<AtomicUsize>,
    transformer: Arc<dyn Transformer>,
    nb_bins: usize,
}

impl ShardedIndex {
    /// Build an empty index for k-mers of `kmer_length` sharded on `prefix_length` symbols.
    ///
    /// The transformer must split k-mers with the same lengths.
    pub fn new(
        kmer_length: usize,
        prefix_length: usize,
        transformer: Arc<dyn Transformer>,
    ) -> std::result::Result<Self, ConfigurationError> {
        let layout = KmerLayout::new(kmer_length, prefix_length)?;
        let got = transformer.layout();
        if got != layout {
            return Err(ConfigurationError::LayoutMismatch {
                kmer_length,
                prefix_length,
                got_kmer_length: got.kmer_length(),
                got_prefix_length: got.prefix_length(),
            });
        }

        let shard_count = layout.shard_count();
        debug!("Allocating {} shards for {}", shard_count, layout);
        let shards = (0..shard_count).map(|_| Shard::new()).collect();

        Ok(Self {
            shards,
            size: CachePadded::new(AtomicUsize::new(0)),
            transformer,
            nb_bins: DEFAULT_NB_BINS,
        })
    }

    /// Build the transformer and the index described by `settings`.
    pub fn from_settings(settings: &Settings) -> std::result::Result<Self, ConfigurationError> {
        settings.validate()?;
        let transformer = settings.transformer()?;
        Ok(Self::new(settings.kmer_length, settings.prefix_length, transformer)?.with_bins(settings.nb_bins))
    }

    /// Number of groups used by [`statistics`](Self::statistics), at least one.
    pub fn with_bins(mut self, nb_bins: usize) -> Self {
        self.nb_bins = nb_bins.max(1);
        self
    }

    pub fn nb_bins(&self) -> usize {
        self.nb_bins
    }

    pub fn layout(&self) -> KmerLayout {
        self.transformer.layout()
    }

    pub fn transformer(&self) -> &Arc<dyn Transformer> {
        &self.transformer
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Insert `kmer`. Returns false if it was already indexed.
    ///
    /// Fails if the k-mer cannot be encoded; the index is left unchanged in that case.
    pub fn insert(&self, kmer: &str) -> Result<bool> {
        let encoded = self.transformer.encode(kmer)?;
        Ok(self.insert_encoded(encoded))
    }

    fn insert_encoded(&self, encoded: EncodedKmer) -> bool {
        let inserted = self.shards[encoded.prefix as usize].insert(encoded.suffix);
        if inserted {
            self.size.fetch_add(1, Ordering::Relaxed);
        }
        inserted
    }

    /// Membership query under the shard's read lock.
    pub fn contains(&self, kmer: &str) -> Result<bool> {
        let encoded = self.transformer.encode(kmer)?;
        Ok(self.shards[encoded.prefix as usize].contains(encoded.suffix))
    }

    /// Number of distinct k-mers, read without locking.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Size of every shard, in prefix order. Each shard is read-locked in turn.
    pub fn shard_sizes(&self) -> Vec<usize> {
        self.shards.iter().map(Shard::size).collect()
    }

    /// Shard size statistics, see [`statistics_from_sizes`].
    pub fn statistics(&self) -> BTreeMap<String, f64> {
        statistics_from_sizes(&self.shard_sizes(), self.nb_bins)
    }

    /// Write a header line then every indexed k-mer, decoded, one per line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl KmerSink for ShardedIndex {
    fn insert_kmer(&self, kmer: &str) -> Result<bool> {
        self.insert(kmer)
    }
}

impl fmt::Display for ShardedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Index ({} k-mers in {} subindexes using transformer {}):",
            self.size(),
            self.shards.len(),
            self.transformer.description()
        )?;
        for (prefix, shard) in self.shards.iter().enumerate() {
            let suffixes = shard.read();
            for &suffix in suffixes.iter() {
                let kmer = self.transformer.decode(EncodedKmer::new(prefix as u64, suffix));
                writeln!(f, "- '{}'", kmer)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ShardedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedIndex")
            .field("layout", &self.layout())
            .field("transformer", &self.transformer.description())
            .field("shards", &self.shards.len())
            .field("size", &self.size())
            .field("nb_bins", &self.nb_bins)
            .finish()
    }
}
