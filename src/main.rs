mod cli_main;

use anyhow::Context;
use clap::Parser;
use cli_main::{Cli, Commands, IndexArgs};
use kmer_shards::index::ShardedIndex;
use kmer_shards::io::KmerReader;
use kmer_shards::pipeline::IndexBuilder;
use kmer_shards::report::RunSummary;
use kmer_shards::settings::Settings;
use kmer_shards::transform::AVAILABLE_METHODS;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Index(args) => run_index(args),
        Commands::Methods => {
            for method in AVAILABLE_METHODS {
                println!("{}", method);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: tracing::Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Setting tracing default failed")
}

/// Settings file (if any) overridden by the command line options.
fn load_settings(args: &IndexArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("Unable to load settings from '{}'", path.display()))?,
        None => Settings::default(),
    };

    if let Some(length) = args.length {
        settings.kmer_length = length;
    }
    if let Some(prefix_length) = args.prefix_length {
        settings.prefix_length = prefix_length;
    }
    if let Some(method) = &args.method {
        settings.method = method.clone();
    }
    if let Some(bins) = args.bins {
        settings.nb_bins = bins;
    }
    if let Some(queue_size) = args.queue_size {
        settings.queue_size = queue_size;
    }
    if args.processors.is_some() {
        settings.processors = args.processors;
    }
    if let Some(tag) = &args.tag {
        settings.tag = tag.clone();
    }
    if settings.tag.is_empty() {
        let names: Vec<String> = args.files.iter().map(|f| f.display().to_string()).collect();
        settings.tag = names.join(",");
    }
    settings.watch_queue |= args.watch_queue;
    if args.quiet {
        settings.verbose = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn run_index(args: IndexArgs) -> anyhow::Result<()> {
    let settings = load_settings(&args)?;

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else if settings.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    init_logging(level)?;

    info!("Settings:\n{}", settings);
    for file in &args.files {
        info!("File to process: '{}'", file.display());
    }

    let index = Arc::new(ShardedIndex::from_settings(&settings)?);
    let readers = args
        .files
        .iter()
        .map(|file| {
            KmerReader::open(file, settings.kmer_length)
                .with_context(|| format!("Unable to open fasta/fastq file '{}'", file.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let report = IndexBuilder::from_settings(Arc::clone(&index), &settings).run(readers)?;
    let statistics = index.statistics();

    let summary = RunSummary {
        settings: &settings,
        method: index.transformer().description(),
        report: &report,
        statistics: &statistics,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.json {
        summary.write_json(&mut out)?;
    } else {
        summary.write_tsv(&mut out)?;
    }
    if args.dump {
        index.write_to(&mut out)?;
    }
    out.flush()?;

    info!("{} distinct k-mers in {} shards", index.size(), index.shard_count());
    Ok(())
}
