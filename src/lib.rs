//! kmer-shards - a concurrent, prefix-sharded k-mer membership index
//!
//! K-mers read from FASTA/FASTQ sources are encoded by a bijective [`transform::Transformer`]
//! into a (prefix, suffix) pair. The prefix selects one of the `4^prefix_length` shards of a
//! [`index::ShardedIndex`], the suffix is stored in that shard. Collectors (one per source) and
//! processors exchange k-mers through a [`queue::BoundedQueue`].
//!
//! ```no_run
//! use kmer_shards::index::ShardedIndex;
//! use kmer_shards::io::KmerReader;
//! use kmer_shards::pipeline::IndexBuilder;
//! use kmer_shards::settings::Settings;
//! use std::sync::Arc;
//!
//! let settings = Settings::default();
//! let index = Arc::new(ShardedIndex::from_settings(&settings)?);
//! let reader = KmerReader::open("reads.fastq.gz", settings.kmer_length)?;
//! let report = IndexBuilder::from_settings(Arc::clone(&index), &settings).run(vec![reader])?;
//! println!("{} k-mers in {:?}", index.size(), report.elapsed);
//! # Ok::<(), kmer_shards::Error>(())
//! ```

pub mod error;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod queue;
pub mod report;
pub mod settings;
pub mod sync;
pub mod transform;

pub use error::{ConfigurationError, EncodingError, Error, PipelineError, Result};
