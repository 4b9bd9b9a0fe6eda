use anyhow::Result;
use clap::{Parser, Subcommand};
use logmerge::catalog::Catalog;
use logmerge::config::PipelineConfig;
use logmerge::merge;
use logmerge::stats::format_runtime;
use logmerge::training;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(
    name = "sparql-logs",
    about = "Merge chat logs with live SPARQL results and build query-generation training sets"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every *.jsonl log in a directory into one deduplicated file,
    /// executing the last SPARQL query of each AI answer.
    ///
    /// The output is truncated first; deduplication is by `timestamp` within this run only.
    Merge {
        /// Directory holding the raw JSONL logs (default: $LOGMERGE_LOG_DIR or data/logs).
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Merged output file (default: $LOGMERGE_MERGED_PATH or data/langfuse.jsonl).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Extract (question, query) pairs with non-empty results from a merged log.
    TrainingSet {
        /// Merged log to read (default: $LOGMERGE_MERGED_PATH or data/langfuse.jsonl).
        input: Option<PathBuf>,

        /// Training file to write (default: $LOGMERGE_TRAINING_PATH or data/train_sparql.jsonl).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command {
        None => run_merge(&config, None, None),
        Some(Commands::Merge { log_dir, out }) => run_merge(&config, log_dir, out),
        Some(Commands::TrainingSet { input, out }) => run_training_set(&config, input, out),
    }
}

fn run_merge(
    config: &PipelineConfig,
    log_dir: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let log_dir = log_dir.unwrap_or_else(|| config.log_dir.clone());
    let out = out.unwrap_or_else(|| config.merged_path.clone());
    let catalog = Catalog::default();

    println!("Merging logs from {} into {}", log_dir.display(), out.display());
    let start = Instant::now();
    let stats = merge::merge_logs(config, &catalog, &log_dir, &out)?;

    for line in stats.summary_lines() {
        println!("{line}");
    }
    println!("{}", format_runtime(start.elapsed()));
    println!("Output file: {}", out.display());
    Ok(())
}

fn run_training_set(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.merged_path.clone());
    let out = out.unwrap_or_else(|| config.training_path.clone());

    println!("Processing {}", input.display());
    let stats = training::build_training_set(&input, &out)?;
    println!(
        "Training dataset saved to {} (records={} candidates={} written={} duplicates={})",
        out.display(),
        stats.records_read,
        stats.candidates,
        stats.written,
        stats.duplicates,
    );
    Ok(())
}
