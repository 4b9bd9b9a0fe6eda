//! Turn a merged log into (question, query) training pairs.
//!
//! Only queries that returned at least one binding are kept, once per
//! `(question, sparql_query)` pair (compared trimmed), in first-seen order.
//! Unlike the merge stage this is strict: a bad line aborts the run.

use crate::types::{QueryResult, TrainingRecord};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrainingStats {
    pub records_read: usize,
    /// Query results with at least one binding.
    pub candidates: usize,
    pub written: usize,
    pub duplicates: usize,
}

pub fn build_training_set(input: &Path, output: &Path) -> Result<TrainingStats> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("open merged log {}", input.display()))?,
    );
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("create training file {}", output.display()))?,
    );

    let stats = write_training_records(reader, &mut writer)?;
    writer.flush().context("flush training file")?;
    Ok(stats)
}

pub fn write_training_records<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
) -> Result<TrainingStats> {
    let mut stats = TrainingStats::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no} is not valid JSON"))?;
        stats.records_read += 1;

        for result in successful_results(&record, line_no)? {
            stats.candidates += 1;
            let key = (
                result.question.trim().to_string(),
                result.sparql_query.trim().to_string(),
            );
            if !seen.insert(key) {
                stats.duplicates += 1;
                continue;
            }
            serde_json::to_writer(&mut *writer, &TrainingRecord::from_query_result(&result))?;
            writer.write_all(b"\n")?;
            stats.written += 1;
        }
    }

    Ok(stats)
}

/// Query results attached to the record's turns that have at least one binding.
fn successful_results(record: &Value, line_no: usize) -> Result<Vec<QueryResult>> {
    let Some(messages) = record.pointer("/output/messages").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let mut found = Vec::new();
    for turn in messages {
        let Some(raw) = turn
            .get("query_results")
            .filter(|v| !v.is_null() && v.as_object().map_or(true, |m| !m.is_empty()))
        else {
            continue;
        };
        let result: QueryResult = serde_json::from_value(raw.clone())
            .with_context(|| format!("invalid query_results on line {line_no}"))?;
        if !result.results.is_empty() {
            found.push(result);
        }
    }
    Ok(found)
}
