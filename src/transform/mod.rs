//! K-mer transformers - bijections between a k-mer and an encoded (prefix, suffix) pair
//!
//! A transformer may reorder the k-mer symbols before packing them at 2 bits per nucleotide
//! (A = 00, C = 01, G = 10, T = 11, most significant symbol first). The packed prefix
//! selects an index shard and the packed suffix is the value stored in that shard, so
//! `decode(encode(kmer)) == kmer` must hold for every valid k-mer.

pub mod identity;
pub mod permutation;
pub mod registry;

pub use identity::IdentityTransformer;
pub use permutation::PermutationTransformer;
pub use registry::{TransformerKind, AVAILABLE_METHODS};

use crate::error::{ConfigurationError, EncodingError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest prefix length: 4^13 shards (> 67M) is already enormous.
pub const MAX_PREFIX_LENGTH: usize = 13;

/// Largest suffix length fitting a 64 bits word.
pub const MAX_SUFFIX_LENGTH: usize = 32;

const NUCLEOTIDES: [u8; 4] = *b"ACGT";

/// A k-mer split into its packed prefix and packed suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EncodedKmer {
    pub prefix: u64,
    pub suffix: u64,
}

impl EncodedKmer {
    pub fn new(prefix: u64, suffix: u64) -> Self {
        Self { prefix, suffix }
    }
}

/// How a k-mer of length `kmer_length` is split: the first `prefix_length` symbols (after any
/// transform-specific reordering) form the prefix, the remaining ones the suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KmerLayout {
    kmer_length: usize,
    prefix_length: usize,
}

impl KmerLayout {
    pub fn new(kmer_length: usize, prefix_length: usize) -> Result<Self, ConfigurationError> {
        if kmer_length == 0 {
            return Err(ConfigurationError::InvalidKmerLength(kmer_length));
        }
        if prefix_length == 0 || prefix_length > MAX_PREFIX_LENGTH {
            return Err(ConfigurationError::InvalidPrefixLength(prefix_length));
        }
        if prefix_length >= kmer_length {
            return Err(ConfigurationError::PrefixNotShorterThanKmer {
                kmer_length,
                prefix_length,
            });
        }
        let suffix_length = kmer_length - prefix_length;
        if suffix_length > MAX_SUFFIX_LENGTH {
            return Err(ConfigurationError::SuffixTooLong(suffix_length));
        }
        Ok(Self {
            kmer_length,
            prefix_length,
        })
    }

    #[inline]
    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    #[inline]
    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    #[inline]
    pub fn suffix_length(&self) -> usize {
        self.kmer_length - self.prefix_length
    }

    /// Number of distinct prefixes, i.e. 4^prefix_length.
    #[inline]
    pub fn shard_count(&self) -> usize {
        1usize << (2 * self.prefix_length)
    }

    pub(crate) fn check_length(&self, kmer: &[u8]) -> Result<(), EncodingError> {
        if kmer.len() != self.kmer_length {
            return Err(EncodingError::UnexpectedLength {
                expected: self.kmer_length,
                got: kmer.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for KmerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k = {} (prefix {} + suffix {})", self.kmer_length, self.prefix_length, self.suffix_length())
    }
}

/// The capability every k-mer transformer provides.
///
/// Implementations are immutable once built and shared read-only between the index and all
/// workers, hence the `Send + Sync` bound.
pub trait Transformer: Send + Sync + fmt::Debug {
    fn layout(&self) -> KmerLayout;

    /// Human readable name, reported alongside the statistics.
    fn description(&self) -> &str;

    /// Split and pack `kmer`. Fails on a symbol outside {A, C, G, T} or a wrong length.
    fn encode(&self, kmer: &str) -> Result<EncodedKmer, EncodingError>;

    /// Rebuild the k-mer from its encoding.
    fn decode(&self, encoded: EncodedKmer) -> String;

    fn kmer_length(&self) -> usize {
        self.layout().kmer_length()
    }

    fn prefix_length(&self) -> usize {
        self.layout().prefix_length()
    }

    fn suffix_length(&self) -> usize {
        self.layout().suffix_length()
    }
}

/// 2-bit code of an uppercase nucleotide.
#[inline]
pub fn nucleotide_code(symbol: u8) -> Option<u64> {
    match symbol {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

pub(crate) fn invalid_symbol(kmer: &[u8], position: usize) -> EncodingError {
    EncodingError::InvalidSymbol {
        kmer: String::from_utf8_lossy(kmer).into_owned(),
        symbol: char::from(kmer[position]),
        position,
    }
}

/// Pack `kmer[start..start + len]` right aligned, most significant symbol first.
pub fn pack(kmer: &[u8], start: usize, len: usize) -> Result<u64, EncodingError> {
    let mut value = 0u64;
    for position in start..start + len {
        let code = nucleotide_code(kmer[position]).ok_or_else(|| invalid_symbol(kmer, position))?;
        value = (value << 2) | code;
    }
    Ok(value)
}

/// Append the `len` symbols packed in `value` to `out`.
pub fn unpack_into(mut value: u64, len: usize, out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + len, b'A');
    for slot in out[start..].iter_mut().rev() {
        *slot = NUCLEOTIDES[(value & 3) as usize];
        value >>= 2;
    }
}

/// Decode `len` symbols packed in `value`.
pub fn unpack(value: u64, len: usize) -> String {
    let mut out = Vec::with_capacity(len);
    unpack_into(value, len, &mut out);
    bytes_to_kmer(out)
}

/// Every byte produced by [`unpack_into`] is ASCII.
pub(crate) fn bytes_to_kmer(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
