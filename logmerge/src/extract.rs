//! Locating SPARQL queries inside a free-text AI answer.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// One query found in a response, with the endpoint it targets when the
/// response names one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedQuery {
    pub query: Option<String>,
    pub endpoint_url: Option<String>,
}

pub trait QueryExtractor {
    /// All queries found in `text`, in order of appearance. May be empty.
    fn extract(&self, text: &str) -> Result<Vec<ExtractedQuery>>;
}

static SPARQL_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```sparql[^\n]*\n(.*?)```").unwrap());
static ENDPOINT_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#[^\n]*?(https?://[^\s>]+)").unwrap());

/// Markdown fenced ```` ```sparql ```` blocks. The endpoint comes from the
/// first `#` comment line in the block holding a URL, e.g.
/// `#+ endpoint: https://sparql.uniprot.org/sparql/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FencedBlockExtractor;

impl QueryExtractor for FencedBlockExtractor {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedQuery>> {
        let found = SPARQL_BLOCK
            .captures_iter(text)
            .filter_map(|caps| {
                let body = caps.get(1)?.as_str().trim();
                if body.is_empty() {
                    return None;
                }
                let endpoint_url = ENDPOINT_COMMENT
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
                Some(ExtractedQuery {
                    query: Some(body.to_string()),
                    endpoint_url,
                })
            })
            .collect();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_blocks_yields_nothing() {
        let found = FencedBlockExtractor
            .extract("I could not find a matching query, sorry.")
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn extracts_query_and_endpoint_comment() {
        let text = "Here you go:\n\n```sparql\n#+ endpoint: https://sparql.uniprot.org/sparql/\nSELECT ?s WHERE { ?s ?p ?o }\n```\n\nDone.";
        let found = FencedBlockExtractor.extract(text).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].endpoint_url.as_deref(),
            Some("https://sparql.uniprot.org/sparql/")
        );
        assert_eq!(
            found[0].query.as_deref(),
            Some("#+ endpoint: https://sparql.uniprot.org/sparql/\nSELECT ?s WHERE { ?s ?p ?o }")
        );
    }

    #[test]
    fn keeps_blocks_in_order() {
        let text = "```sparql\n# https://a.example/sparql\nSELECT 1 {}\n```\nthen\n```SPARQL\n# https://b.example/sparql\nSELECT 2 {}\n```";
        let found = FencedBlockExtractor.extract(text).unwrap();
        let endpoints: Vec<_> = found
            .iter()
            .map(|q| q.endpoint_url.as_deref().unwrap())
            .collect();
        assert_eq!(endpoints, ["https://a.example/sparql", "https://b.example/sparql"]);
    }

    #[test]
    fn block_without_endpoint_has_none() {
        let text = "```sparql\nSELECT ?s WHERE { ?s ?p ?o }\n```";
        let found = FencedBlockExtractor.extract(text).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].endpoint_url, None);
    }

    #[test]
    fn ignores_other_languages_and_empty_blocks() {
        let text = "```python\nprint('x')\n```\n```sparql\n\n```";
        assert!(FencedBlockExtractor.extract(text).unwrap().is_empty());
    }
}
