/// Custom Result type for index operations, wrapping the crate [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type, encompassing every failure the indexing core can report.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid settings detected while building a transformer or an index
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A k-mer that cannot be packed by a transformer
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// Worker lifecycle failures
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Standard I/O errors (opening or reading an input source)
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// FASTQ record parsing errors
    #[error(transparent)]
    Fastq(#[from] bio::io::fastq::Error),
    /// Settings file (de)serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised at construction time. These are fatal: nothing is recovered.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The transformer selector does not name a known transformer
    #[error("Unsupported transformation method '{0}'")]
    UnknownTransformer(String),

    /// The k-mer length must be strictly positive
    #[error("Invalid k-mer length: {0}. Expected a strictly positive value")]
    InvalidKmerLength(usize),

    /// The prefix length is outside [1, 13]
    #[error("Invalid prefix length: {0}. Expected a value in [1, {max}]", max = crate::transform::MAX_PREFIX_LENGTH)]
    InvalidPrefixLength(usize),

    /// The prefix must be strictly shorter than the k-mer
    #[error("The prefix length ({prefix_length}) must be strictly less than the k-mer length ({kmer_length})")]
    PrefixNotShorterThanKmer {
        kmer_length: usize,
        prefix_length: usize,
    },

    /// The suffix does not fit in a 64 bits word (2 bits per symbol)
    #[error("The suffix length ({0}) exceeds {max} nucleotides", max = crate::transform::MAX_SUFFIX_LENGTH)]
    SuffixTooLong(usize),

    /// The statistics need at least one bin
    #[error("The number of statistics bins must be strictly positive")]
    InvalidBinCount,

    /// The queue needs room for at least one k-mer
    #[error("The queue size must be strictly positive")]
    InvalidQueueSize,

    /// An explicit permutation is not a permutation of [0, k)
    #[error("Invalid permutation for k = {kmer_length}: {reason}")]
    InvalidPermutation { kmer_length: usize, reason: String },

    /// The transformer does not split k-mers the way the index expects
    #[error("Transformer layout (k = {got_kmer_length}, prefix = {got_prefix_length}) does not match the index (k = {kmer_length}, prefix = {prefix_length})")]
    LayoutMismatch {
        kmer_length: usize,
        prefix_length: usize,
        got_kmer_length: usize,
        got_prefix_length: usize,
    },
}

/// Errors raised while packing a k-mer. These indicate that the upstream reader let an invalid
/// k-mer through; continuing would break shard selection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A symbol outside {A, C, G, T}
    #[error("Invalid nucleotide '{symbol}' at position {position} in k-mer '{kmer}'")]
    InvalidSymbol {
        kmer: String,
        symbol: char,
        position: usize,
    },

    /// The k-mer does not have the transformer's length
    #[error("K-mer length ({got}) does not match the transformer ({expected})")]
    UnexpectedLength { expected: usize, got: usize },
}

/// Errors related to the worker lifecycle
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// `join()` was called on a worker whose thread was never started
    #[error("{role} #{id} was never started")]
    NotStarted { role: &'static str, id: usize },

    /// The worker thread panicked
    #[error("{role} #{id} panicked")]
    Panicked { role: &'static str, id: usize },

    /// Another worker failed and the run was aborted
    #[error("{role} #{id} stopped: the pipeline was aborted")]
    Aborted { role: &'static str, id: usize },

    /// The OS refused to spawn the worker thread
    #[error("Unable to spawn {role} #{id}: {reason}")]
    Spawn {
        role: &'static str,
        id: usize,
        reason: String,
    },
}
