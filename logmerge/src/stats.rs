use serde::Serialize;
use std::time::Duration;

/// Counters accumulated over one merge run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Non-blank raw lines read, parseable or not.
    pub total: usize,
    pub no_output: usize,
    pub example_only: usize,
    /// Records written to the merged log.
    pub unique: usize,
    /// AI turns that received a `query_results` entry (including empty or failed executions).
    pub msgs_with_results: usize,
    /// AI turns with no usable query.
    pub msgs_no_results: usize,
    /// Human turns asking one of the canned example questions.
    pub example_msgs: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub no_timestamp: usize,
    /// Subset of `msgs_with_results` whose execution failed.
    pub query_errors: usize,
    pub files: usize,
}

impl RunStats {
    pub fn counts(&self) -> [(&'static str, usize); 12] {
        [
            ("total", self.total),
            ("no_output", self.no_output),
            ("example_only", self.example_only),
            ("unique", self.unique),
            ("msgs_with_results", self.msgs_with_results),
            ("msgs_no_results", self.msgs_no_results),
            ("example_msgs", self.example_msgs),
            ("malformed", self.malformed),
            ("duplicates", self.duplicates),
            ("no_timestamp", self.no_timestamp),
            ("query_errors", self.query_errors),
            ("files", self.files),
        ]
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Input lines: {}", self.total),
            format!("Unique timestamps written: {}", self.unique),
            format!("Example only entries skipped: {}", self.example_only),
            format!("No output field entries skipped: {}", self.no_output),
            format!("Malformed entries skipped: {}", self.malformed),
            format!("Duplicate timestamps skipped: {}", self.duplicates),
            format!("Entries without timestamp skipped: {}", self.no_timestamp),
            format!("Messages with SPARQL results: {}", self.msgs_with_results),
            format!("Messages with failed SPARQL execution: {}", self.query_errors),
            format!("Messages with no SPARQL results: {}", self.msgs_no_results),
            format!("Example messages not skipped: {}", self.example_msgs),
        ]
    }
}

/// `Runtime: 1h 2m (3s) - 62.05 minutes`
pub fn format_runtime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!(
        "Runtime: {hours}h {minutes}m ({seconds}s) - {:.2} minutes",
        elapsed.as_secs_f64() / 60.0
    )
}
