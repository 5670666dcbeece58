// src/pipeline/lcp.rs
//! Longest common prefix statistics between consecutive encoded k-mers.
//!
//! Two overlapping k-mers of a sequence that share a long encoded prefix land in the same
//! shard; the average LCP over a source tells how well a transformer spreads them.

use super::collector::KmerHook;
use crate::error::Result;
use crate::transform::{EncodedKmer, Transformer};
use serde::Serialize;
use std::sync::Arc;

/// Length, in symbols, of the longest common prefix of two encoded k-mers.
///
/// The prefixes are compared first (on `prefix_length` symbols); when equal, the suffixes
/// are compared on the remaining `kmer_length - prefix_length` symbols.
pub fn lcp(e1: EncodedKmer, e2: EncodedKmer, kmer_length: usize, prefix_length: usize) -> usize {
    let v = e1.prefix ^ e2.prefix;
    if v != 0 {
        let p = (u64::BITS - v.leading_zeros()) as usize;
        return ((prefix_length << 1) - p) >> 1;
    }

    let suffix_length = kmer_length - prefix_length;
    let mask = if (suffix_length << 1) < u64::BITS as usize {
        (1u64 << (suffix_length << 1)) - 1
    } else {
        u64::MAX
    };
    let v = (e1.suffix ^ e2.suffix) & mask;
    if v != 0 {
        let p = (u64::BITS - v.leading_zeros()) as usize;
        (((suffix_length << 1) - p) >> 1) + prefix_length
    } else {
        kmer_length
    }
}

/// Running count, sum and sum of squares of LCP values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LcpStats {
    nb_values: usize,
    sum: f64,
    sum_sq: f64,
}

impl LcpStats {
    pub fn record(&mut self, value: usize) {
        let value = value as f64;
        self.nb_values += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count, mean and population variance of the recorded values (all zero when empty).
    pub fn summary(&self) -> LcpSummary {
        if self.nb_values == 0 {
            return LcpSummary::default();
        }
        let n = self.nb_values as f64;
        let average = self.sum / n;
        LcpSummary {
            nb_values: self.nb_values,
            average,
            variance: self.sum_sq / n - average * average,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LcpSummary {
    pub nb_values: usize,
    pub average: f64,
    pub variance: f64,
}

/// Collector hook computing the LCP of each k-mer with the previous one of the same sequence.
#[derive(Debug)]
pub struct LcpHook {
    transformer: Arc<dyn Transformer>,
    previous: Option<EncodedKmer>,
    stats: LcpStats,
}

impl LcpHook {
    pub fn new(transformer: Arc<dyn Transformer>) -> Self {
        Self {
            transformer,
            previous: None,
            stats: LcpStats::default(),
        }
    }

    pub fn stats(&self) -> &LcpStats {
        &self.stats
    }

    pub fn summary(&self) -> LcpSummary {
        self.stats.summary()
    }
}

impl KmerHook for LcpHook {
    fn observe(&mut self, kmer: &str, relative_id: u64) -> Result<()> {
        let encoded = self.transformer.encode(kmer)?;
        if relative_id != 1 {
            if let Some(previous) = self.previous {
                self.stats.record(lcp(
                    previous,
                    encoded,
                    self.transformer.kmer_length(),
                    self.transformer.prefix_length(),
                ));
            }
        }
        self.previous = Some(encoded);
        Ok(())
    }
}
