//! Static data shared with the chat producer: the canned example questions it
//! offers in its UI, and the SPARQL endpoints it has retired.
//!
//! Both tables must be kept in sync with the producer. Changing them only
//! affects future runs; records already merged are never rewritten.

use std::collections::{HashMap, HashSet};

/// Example questions offered as one-click demos by the chat UI.
const EXAMPLE_QUESTIONS: &[&str] = &[
    "Which SIB resources are supported by ExpasyGPT? ",
    "Where is the ACE2 gene expressed in humans?",
    "List primate genes expressed in the fruit fly eye",
    "What are the rat orthologs of the human HBB gene?",
    "What are the rat orthologs of the human TP53 gene?",
    "What is the HGNC symbol for the P68871 protein?",
    "Anatomical entities where the INS zebrafish gene is expressed and their gene GO annotations",
];

/// Decommissioned endpoint URL -> replacement URL.
const RETIRED_ENDPOINTS: &[(&str, &str)] = &[(
    "https://biosoda.unil.ch/graphdb/repositories/emi-dbgi",
    "https://kg.earthmetabolome.org/metrin/api/",
)];

/// Immutable lookup tables, built once at startup and passed by reference
/// into the normalizer and the enrichment engine.
#[derive(Debug, Clone)]
pub struct Catalog {
    example_questions: HashSet<String>,
    retired_endpoints: HashMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(
            EXAMPLE_QUESTIONS.iter().copied(),
            RETIRED_ENDPOINTS.iter().copied(),
        )
    }
}

impl Catalog {
    /// Questions are trimmed on insert; lookups always compare trimmed text.
    pub fn new<'a>(
        example_questions: impl IntoIterator<Item = &'a str>,
        retired_endpoints: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            example_questions: example_questions
                .into_iter()
                .map(|q| q.trim().to_string())
                .collect(),
            retired_endpoints: retired_endpoints
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    pub fn is_example_question(&self, text: &str) -> bool {
        self.example_questions.contains(text.trim())
    }

    /// Replacement URL for a retired endpoint, or the input unchanged.
    pub fn remap_endpoint<'a>(&'a self, endpoint: &'a str) -> &'a str {
        self.retired_endpoints
            .get(endpoint)
            .map(String::as_str)
            .unwrap_or(endpoint)
    }
}
