// src/transform/identity.rs
use super::{bytes_to_kmer, pack, unpack_into, EncodedKmer, KmerLayout, Transformer};
use crate::error::EncodingError;

/// Packs the k-mer as is: the prefix is the first `prefix_length` symbols.
#[derive(Debug, Clone)]
pub struct IdentityTransformer {
    layout: KmerLayout,
}

impl IdentityTransformer {
    pub fn new(layout: KmerLayout) -> Self {
        Self { layout }
    }
}

impl Transformer for IdentityTransformer {
    fn layout(&self) -> KmerLayout {
        self.layout
    }

    fn description(&self) -> &str {
        "Identity"
    }

    fn encode(&self, kmer: &str) -> Result<EncodedKmer, EncodingError> {
        let bytes = kmer.as_bytes();
        self.layout.check_length(bytes)?;
        let prefix_length = self.layout.prefix_length();
        Ok(EncodedKmer {
            prefix: pack(bytes, 0, prefix_length)?,
            suffix: pack(bytes, prefix_length, self.layout.suffix_length())?,
        })
    }

    fn decode(&self, encoded: EncodedKmer) -> String {
        let mut out = Vec::with_capacity(self.layout.kmer_length());
        unpack_into(encoded.prefix, self.layout.prefix_length(), &mut out);
        unpack_into(encoded.suffix, self.layout.suffix_length(), &mut out);
        bytes_to_kmer(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_kmers(k: usize) -> impl Iterator<Item = String> {
        (0..1u64 << (2 * k)).map(move |v| super::super::unpack(v, k))
    }

    #[test]
    fn test_acgct_example() {
        let transformer = IdentityTransformer::new(KmerLayout::new(5, 2).unwrap());
        let encoded = transformer.encode("ACGCT").unwrap();
        assert_eq!(encoded, EncodedKmer { prefix: 1, suffix: 39 });
        assert_eq!(transformer.decode(EncodedKmer::new(1, 39)), "ACGCT");
    }

    #[test]
    fn test_roundtrip_every_kmer() {
        let transformer = IdentityTransformer::new(KmerLayout::new(6, 2).unwrap());
        for kmer in all_kmers(6) {
            let encoded = transformer.encode(&kmer).unwrap();
            assert!(encoded.prefix < 16);
            assert_eq!(transformer.decode(encoded), kmer);
        }
    }

    #[test]
    fn test_wide_suffix() {
        // 13 + 32 symbols: both words fully used.
        let transformer = IdentityTransformer::new(KmerLayout::new(45, 13).unwrap());
        let kmer = "T".repeat(45);
        let encoded = transformer.encode(&kmer).unwrap();
        assert_eq!(encoded.prefix, (1 << 26) - 1);
        assert_eq!(encoded.suffix, u64::MAX);
        assert_eq!(transformer.decode(encoded), kmer);
    }

    #[test]
    fn test_encode_errors() {
        let transformer = IdentityTransformer::new(KmerLayout::new(5, 2).unwrap());
        assert!(matches!(
            transformer.encode("ACGNT"),
            Err(EncodingError::InvalidSymbol { symbol: 'N', position: 3, .. })
        ));
        assert_eq!(
            transformer.encode("ACG"),
            Err(EncodingError::UnexpectedLength { expected: 5, got: 3 })
        );
    }
}
