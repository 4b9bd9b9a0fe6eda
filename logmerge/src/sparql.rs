use crate::types::Binding;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Error)]
pub enum SparqlError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("invalid SPARQL JSON response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// SPARQL 1.1 JSON results. Only SELECT result sets carry `results`;
/// ASK and CONSTRUCT responses decode with no bindings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SparqlResponse {
    #[serde(default)]
    pub results: Option<ResultSet>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl SparqlResponse {
    pub fn into_bindings(self) -> Vec<Binding> {
        self.results.map(|r| r.bindings).unwrap_or_default()
    }
}

pub trait SparqlExecutor {
    fn execute(
        &self,
        query: &str,
        endpoint: &str,
        timeout: Duration,
        post: bool,
    ) -> Result<SparqlResponse, SparqlError>;
}

impl<X: SparqlExecutor + ?Sized> SparqlExecutor for &X {
    fn execute(
        &self,
        query: &str,
        endpoint: &str,
        timeout: Duration,
        post: bool,
    ) -> Result<SparqlResponse, SparqlError> {
        (**self).execute(query, endpoint, timeout, post)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpSparqlClient {
    http: Client,
}

impl HttpSparqlClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SparqlExecutor for HttpSparqlClient {
    fn execute(
        &self,
        query: &str,
        endpoint: &str,
        timeout: Duration,
        post: bool,
    ) -> Result<SparqlResponse, SparqlError> {
        let request = if post {
            self.http.post(endpoint).form(&[("query", query)])
        } else {
            self.http.get(endpoint).query(&[("query", query)])
        };
        let transport = |source| SparqlError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let res = request
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .timeout(timeout)
            .send()
            .map_err(transport)?;

        let status = res.status();
        let body = res.text().map_err(transport)?;
        if !status.is_success() {
            return Err(SparqlError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        serde_json::from_str(&body).map_err(|source| SparqlError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
