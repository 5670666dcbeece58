use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kmer-shards", version, about = "Concurrent prefix-sharded k-mer index", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index every k-mer of the given FASTA/FASTQ(.gz) files and print shard statistics
    Index(IndexArgs),

    /// List the available transformation methods
    Methods,
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Input FASTA or FASTQ files (one collector per file)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// JSON settings file; command line options override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// K-mer length
    #[arg(short = 'k', long)]
    pub length: Option<usize>,

    /// Number of leading (transformed) nucleotides selecting the shard, in [1, 13]
    #[arg(short, long)]
    pub prefix_length: Option<usize>,

    /// Transformation method (see the `methods` command)
    #[arg(short, long)]
    pub method: Option<String>,

    /// Number of bins for the shard size distribution
    #[arg(short, long)]
    pub bins: Option<usize>,

    /// Queue capacity (rounded up to a power of two)
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// Number of k-mer processors (default: heuristic from the available threads)
    #[arg(long)]
    pub processors: Option<usize>,

    /// Experiment tag (default: the comma separated list of files)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Sample the queue occupancy while reading
    #[arg(long)]
    pub watch_queue: bool,

    /// Print the results as JSON instead of a tab separated table
    #[arg(long)]
    pub json: bool,

    /// Dump every indexed k-mer after the results
    #[arg(long)]
    pub dump: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}
