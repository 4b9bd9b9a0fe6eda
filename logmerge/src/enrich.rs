//! Attach live query results to the AI turns of a normalized record.
//!
//! When an answer contains several queries only the last one is executed:
//! later queries in a response are taken to supersede earlier drafts. This
//! is a heuristic and can pick the wrong query when an answer ends with an
//! unrelated example.

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::extract::QueryExtractor;
use crate::limit::enforce_limit;
use crate::normalize::LogRecord;
use crate::parse::content_text;
use crate::sparql::SparqlExecutor;
use crate::stats::RunStats;
use crate::types::{QueryResult, TurnKind};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct QuerySettings {
    pub timeout: Duration,
    pub result_limit: u64,
    pub use_post: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl QuerySettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            timeout: config.query_timeout(),
            result_limit: config.result_limit,
            use_post: config.use_post,
        }
    }
}

pub struct Enricher<'a, E, X> {
    catalog: &'a Catalog,
    extractor: E,
    executor: X,
    settings: QuerySettings,
}

impl<'a, E: QueryExtractor, X: SparqlExecutor> Enricher<'a, E, X> {
    pub fn new(catalog: &'a Catalog, extractor: E, executor: X, settings: QuerySettings) -> Self {
        Self {
            catalog,
            extractor,
            executor,
            settings,
        }
    }

    /// Walk the turns in order. Each AI turn is paired with the nearest
    /// preceding human question (empty before the first one). A failure on one
    /// turn never aborts the record.
    pub fn enrich_record(&self, record: &mut LogRecord, stats: &mut RunStats) {
        let Some(messages) = record.messages_mut() else {
            return;
        };

        let mut question = String::new();
        for turn in messages.iter_mut() {
            match TurnKind::of(turn) {
                TurnKind::Human => {
                    question = content_text(turn).trim().to_string();
                    if self.catalog.is_example_question(&question) {
                        stats.example_msgs += 1;
                    }
                }
                TurnKind::Ai => match self.enrich_turn(&question, turn) {
                    Ok(Some(failed)) => {
                        stats.msgs_with_results += 1;
                        if failed {
                            stats.query_errors += 1;
                        }
                    }
                    Ok(None) => stats.msgs_no_results += 1,
                    Err(e) => {
                        warn!(err = %e, "failed to extract/execute SPARQL");
                        stats.msgs_no_results += 1;
                    }
                },
                TurnKind::Other => {}
            }
        }
    }

    /// `Some(failed)` when a result was attached to the turn.
    fn enrich_turn(&self, question: &str, turn: &mut Value) -> Result<Option<bool>> {
        let Some(result) = self.run_last_query(question, &content_text(turn))? else {
            return Ok(None);
        };
        let failed = result.error.is_some();
        turn.as_object_mut()
            .context("turn is not a JSON object")?
            .insert("query_results".to_string(), serde_json::to_value(&result)?);
        Ok(Some(failed))
    }

    /// Execute the last query found in `answer`. `None` when there is no
    /// query, or the last one lacks its text or endpoint.
    pub fn run_last_query(&self, question: &str, answer: &str) -> Result<Option<QueryResult>> {
        let Some(last) = self.extractor.extract(answer)?.pop() else {
            return Ok(None);
        };
        let (Some(query), Some(endpoint)) = (
            last.query.filter(|q| !q.is_empty()),
            last.endpoint_url.filter(|e| !e.is_empty()),
        ) else {
            return Ok(None);
        };

        let endpoint = self.catalog.remap_endpoint(&endpoint).to_string();
        let query = enforce_limit(&query, self.settings.result_limit).into_owned();
        debug!(%endpoint, %query, "executing SPARQL query");

        let (results, error) = match self.executor.execute(
            &query,
            &endpoint,
            self.settings.timeout,
            self.settings.use_post,
        ) {
            Ok(resp) => (resp.into_bindings(), None),
            Err(e) => {
                warn!(%endpoint, err = %e, "SPARQL execution failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(Some(QueryResult {
            question: question.to_string(),
            sparql_query: query,
            sparql_endpoint: endpoint,
            results,
            error,
        }))
    }
}
