use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Default paths (relative to the working directory) ───────────────────

/// Directory holding the raw conversation log files.
const DEFAULT_LOG_DIR: &str = "data/logs";

/// Deduplicated, enriched log written by the merge stage.
const DEFAULT_MERGED_PATH: &str = "data/langfuse.jsonl";

/// Training corpus written by the training-set stage.
const DEFAULT_TRAINING_PATH: &str = "data/train_sparql.jsonl";

// ── Default query execution settings ────────────────────────────────────

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RESULT_LIMIT: u64 = 50;
const DEFAULT_USE_POST: bool = true;
const DEFAULT_PROGRESS_EVERY: usize = 100;

// ── Config struct ───────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub log_dir: PathBuf,
    pub merged_path: PathBuf,
    pub training_path: PathBuf,
    pub query_timeout_secs: u64,
    pub result_limit: u64,
    pub use_post: bool,
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            merged_path: PathBuf::from(DEFAULT_MERGED_PATH),
            training_path: PathBuf::from(DEFAULT_TRAINING_PATH),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            result_limit: DEFAULT_RESULT_LIMIT,
            use_post: DEFAULT_USE_POST,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let home = dirs::home_dir();
        let home = home.as_deref();

        Self {
            log_dir: env_path("LOGMERGE_LOG_DIR", defaults.log_dir, home),
            merged_path: env_path("LOGMERGE_MERGED_PATH", defaults.merged_path, home),
            training_path: env_path("LOGMERGE_TRAINING_PATH", defaults.training_path, home),
            query_timeout_secs: env_u64("LOGMERGE_QUERY_TIMEOUT_SECS", defaults.query_timeout_secs),
            result_limit: env_u64("LOGMERGE_RESULT_LIMIT", defaults.result_limit),
            use_post: env_bool("LOGMERGE_USE_POST", defaults.use_post),
            progress_every: env_usize("LOGMERGE_PROGRESS_EVERY", defaults.progress_every),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

fn env_path(key: &str, default: PathBuf, home: Option<&Path>) -> PathBuf {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => expand_tilde(val.trim(), home),
        _ => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

fn expand_tilde(input: &str, home: Option<&Path>) -> PathBuf {
    if let (Some(rest), Some(home)) = (input.strip_prefix("~/"), home) {
        return home.join(rest);
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventional_layout() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.log_dir, PathBuf::from("data/logs"));
        assert_eq!(cfg.merged_path, PathBuf::from("data/langfuse.jsonl"));
        assert_eq!(cfg.training_path, PathBuf::from("data/train_sparql.jsonl"));
        assert_eq!(cfg.query_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.result_limit, 50);
        assert!(cfg.use_post);
    }

    #[test]
    fn expand_tilde_joins_home() {
        let home = Path::new("/home/someone");
        assert_eq!(
            expand_tilde("~/logs/in", Some(home)),
            PathBuf::from("/home/someone/logs/in")
        );
        assert_eq!(expand_tilde("/abs/path", Some(home)), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("~/logs", None), PathBuf::from("~/logs"));
    }
}
