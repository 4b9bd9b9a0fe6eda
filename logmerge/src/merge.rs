//! Merge a directory of raw conversation logs into one deduplicated,
//! enriched JSONL file.
//!
//! Files are read in sorted path order and lines in file order; the first
//! record carrying a given `timestamp` wins. Every kept record is written as
//! one complete line as soon as it is ready, so an interrupted run leaves a
//! valid prefix of the output. The seen-set lives only for the current run
//! and the output file is truncated at the start.

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::enrich::{Enricher, QuerySettings};
use crate::extract::{FencedBlockExtractor, QueryExtractor};
use crate::normalize::{normalize_line, LogRecord, Rejection};
use crate::sparql::{HttpSparqlClient, SparqlExecutor};
use crate::stats::RunStats;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Duplicate,
    NoTimestamp,
}

/// Append-only JSONL sink that drops records whose timestamp was already written.
pub struct MergeWriter<W: Write> {
    out: W,
    seen: HashSet<String>,
}

impl<W: Write> MergeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            seen: HashSet::new(),
        }
    }

    pub fn write_if_new(&mut self, record: &LogRecord) -> Result<WriteOutcome> {
        let Some(key) = record.timestamp_key() else {
            return Ok(WriteOutcome::NoTimestamp);
        };
        if self.seen.contains(&key) {
            return Ok(WriteOutcome::Duplicate);
        }
        let line = record.to_json_line().context("serialize merged record")?;
        write_jsonl_line(&mut self.out, &line)?;
        self.seen.insert(key);
        Ok(WriteOutcome::Written)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// One complete line per write call, flushed before returning.
fn write_jsonl_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    writer.write_all(&buf).context("write merged record")?;
    writer.flush().context("flush merged record")?;
    Ok(())
}

pub struct LogMerger<'a, E, X> {
    catalog: &'a Catalog,
    enricher: Enricher<'a, E, X>,
    progress_every: usize,
}

impl<'a, E: QueryExtractor, X: SparqlExecutor> LogMerger<'a, E, X> {
    pub fn new(catalog: &'a Catalog, enricher: Enricher<'a, E, X>) -> Self {
        Self {
            catalog,
            enricher,
            progress_every: 100,
        }
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Merge every `*.jsonl` file directly under `log_dir` into `output`.
    /// A missing `log_dir` produces an empty output.
    pub fn merge_dir(&self, log_dir: &Path, output: &Path) -> Result<RunStats> {
        self.merge_files(&list_log_files(log_dir), output)
    }

    /// Merge `files` in the given order into `output`. A file that no longer
    /// exists is skipped.
    pub fn merge_files(&self, files: &[PathBuf], output: &Path) -> Result<RunStats> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output dir {}", parent.display()))?;
        }
        let file = File::create(output)
            .with_context(|| format!("create merged log {}", output.display()))?;
        let mut writer = MergeWriter::new(file);
        let mut stats = RunStats::default();

        for path in files {
            info!(path = %path.display(), "processing log file");
            let file = match File::open(path) {
                Ok(f) => f,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "log file vanished before it could be read");
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("open log file {}", path.display()))
                }
            };
            stats.files += 1;
            self.merge_reader(BufReader::new(file), &mut writer, &mut stats)?;
        }

        info!(
            files = stats.files,
            total = stats.total,
            unique = stats.unique,
            duplicates = stats.duplicates,
            "merge complete"
        );
        Ok(stats)
    }

    /// Merge the lines of one reader. Only write failures are returned as errors.
    pub fn merge_reader<R: BufRead, W: Write>(
        &self,
        reader: R,
        writer: &mut MergeWriter<W>,
        stats: &mut RunStats,
    ) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    stats.total += 1;
                    stats.malformed += 1;
                    warn!(line_no, err = %e, "failed to read log line");
                    continue;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            stats.total += 1;
            if self.progress_every > 0 && stats.total % self.progress_every == 0 {
                info!(total = stats.total, "processed conversations");
            }

            let Some(record) = self.prepare(line, line_no, stats) else {
                continue;
            };
            match writer.write_if_new(&record)? {
                WriteOutcome::Written => stats.unique += 1,
                WriteOutcome::Duplicate => stats.duplicates += 1,
                WriteOutcome::NoTimestamp => stats.no_timestamp += 1,
            }
        }
        Ok(())
    }

    /// Normalize and enrich one non-blank line, updating the rejection counters.
    fn prepare(&self, line: &str, line_no: usize, stats: &mut RunStats) -> Option<LogRecord> {
        match normalize_line(line, self.catalog) {
            Ok(mut record) => {
                self.enricher.enrich_record(&mut record, stats);
                Some(record)
            }
            Err(Rejection::NoOutput) => {
                stats.no_output += 1;
                None
            }
            Err(Rejection::ExampleOnly) => {
                stats.example_only += 1;
                None
            }
            Err(rejection) => {
                stats.malformed += 1;
                warn!(line_no, %rejection, line = %line, "skipping log line");
                None
            }
        }
    }
}

/// Regular `*.jsonl` files directly inside `dir`, sorted by path.
pub fn list_log_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("jsonl"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Run the merge stage with the HTTP client and fenced-block extractor.
pub fn merge_logs(
    config: &PipelineConfig,
    catalog: &Catalog,
    log_dir: &Path,
    output: &Path,
) -> Result<RunStats> {
    let settings = QuerySettings::from_config(config);
    let enricher = Enricher::new(catalog, FencedBlockExtractor, HttpSparqlClient::new(), settings);
    LogMerger::new(catalog, enricher)
        .with_progress_every(config.progress_every)
        .merge_dir(log_dir, output)
}
