// src/transform/permutation.rs
//! Symbol permutation transformer.
//!
//! The k-mer positions are reordered with a fixed permutation `p` before packing
//! (`permuted[i] = kmer[p[i]]`), so the shard is chosen by the symbols at positions
//! `p[0..prefix_length]` instead of the leading ones. Decoding unpacks then applies the
//! inverse permutation. Both are computed once, at construction time.

use super::{bytes_to_kmer, invalid_symbol, nucleotide_code, unpack_into, EncodedKmer, KmerLayout, Transformer};
use crate::error::{ConfigurationError, EncodingError};
use rand::seq::SliceRandom;
use rand::Rng;

fn describe(permutation: &[usize]) -> String {
    let positions: Vec<String> = permutation.iter().map(|p| p.to_string()).collect();
    format!("Permutation[{}]", positions.join(","))
}

#[derive(Debug, Clone)]
pub struct PermutationTransformer {
    layout: KmerLayout,
    permutation: Vec<usize>,
    inverse: Vec<usize>,
    description: String,
}

impl PermutationTransformer {
    /// Build a transformer applying `permutation`, which must be a permutation of
    /// `[0, kmer_length)`. Without a description, one is generated from the permutation.
    pub fn new(
        layout: KmerLayout,
        permutation: Vec<usize>,
        description: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let k = layout.kmer_length();
        let invalid = |reason: String| ConfigurationError::InvalidPermutation {
            kmer_length: k,
            reason,
        };

        if permutation.len() != k {
            return Err(invalid(format!("{} positions given", permutation.len())));
        }
        let mut inverse = vec![usize::MAX; k];
        for (i, &p) in permutation.iter().enumerate() {
            if p >= k {
                return Err(invalid(format!("position {} is out of range", p)));
            }
            if inverse[p] != usize::MAX {
                return Err(invalid(format!("position {} appears twice", p)));
            }
            inverse[p] = i;
        }

        let description = description.unwrap_or_else(|| describe(&permutation));

        Ok(Self {
            layout,
            permutation,
            inverse,
            description,
        })
    }

    /// Draw a permutation uniformly at random.
    pub fn random(layout: KmerLayout) -> Self {
        Self::random_with(layout, &mut rand::thread_rng())
    }

    /// Draw a permutation uniformly at random from `rng`.
    pub fn random_with<R: Rng + ?Sized>(layout: KmerLayout, rng: &mut R) -> Self {
        let mut permutation: Vec<usize> = (0..layout.kmer_length()).collect();
        permutation.shuffle(rng);
        Self::from_valid(layout, permutation, None)
    }

    /// Read the k-mer backwards: `p[i] = k - 1 - i`.
    pub fn inverse(layout: KmerLayout) -> Self {
        let k = layout.kmer_length();
        let permutation = (0..k).map(|i| k - 1 - i).collect();
        Self::from_valid(layout, permutation, Some("Inverse"))
    }

    /// Rotate the k-mer by one position: `p[i] = (i + 1) mod k`.
    pub fn cyclic(layout: KmerLayout) -> Self {
        Self::cyclic_from(layout, 1)
    }

    /// Rotate the k-mer so that it starts at position `pivot`: `p[i] = (i + pivot) mod k`.
    pub fn cyclic_from(layout: KmerLayout, pivot: usize) -> Self {
        let k = layout.kmer_length();
        let shift = pivot % k;
        let permutation = (0..k).map(|i| (i + shift) % k).collect();
        Self::from_valid(layout, permutation, Some("Cyclic"))
    }

    /// Keep even positions, mirror odd ones: `p[i] = i` if `i` is even, `k - i - (k & 1)` otherwise.
    pub fn zigzag(layout: KmerLayout) -> Self {
        let k = layout.kmer_length();
        let permutation = (0..k)
            .map(|i| if i & 1 == 1 { k - i - (k & 1) } else { i })
            .collect();
        Self::from_valid(layout, permutation, Some("ZigZag"))
    }

    fn from_valid(layout: KmerLayout, permutation: Vec<usize>, description: Option<&str>) -> Self {
        let mut inverse = vec![0; permutation.len()];
        for (i, &p) in permutation.iter().enumerate() {
            inverse[p] = i;
        }
        let description = description.map_or_else(|| describe(&permutation), str::to_string);
        Self {
            layout,
            permutation,
            inverse,
            description,
        }
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn inverse_permutation(&self) -> &[usize] {
        &self.inverse
    }
}

impl Transformer for PermutationTransformer {
    fn layout(&self) -> KmerLayout {
        self.layout
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn encode(&self, kmer: &str) -> Result<EncodedKmer, EncodingError> {
        let bytes = kmer.as_bytes();
        self.layout.check_length(bytes)?;

        let prefix_length = self.layout.prefix_length();
        let mut encoded = EncodedKmer::default();
        for (i, &position) in self.permutation.iter().enumerate() {
            let code = nucleotide_code(bytes[position]).ok_or_else(|| invalid_symbol(bytes, position))?;
            if i < prefix_length {
                encoded.prefix = (encoded.prefix << 2) | code;
            } else {
                encoded.suffix = (encoded.suffix << 2) | code;
            }
        }
        Ok(encoded)
    }

    fn decode(&self, encoded: EncodedKmer) -> String {
        let k = self.layout.kmer_length();
        let mut permuted = Vec::with_capacity(k);
        unpack_into(encoded.prefix, self.layout.prefix_length(), &mut permuted);
        unpack_into(encoded.suffix, self.layout.suffix_length(), &mut permuted);
        let kmer = self.inverse.iter().map(|&i| permuted[i]).collect();
        bytes_to_kmer(kmer)
    }
}
