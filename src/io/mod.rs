//! Input sources - k-mer streams over FASTA / FASTQ data

pub mod reader;

pub use reader::{KmerReader, KmerSource};
