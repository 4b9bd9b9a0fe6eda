//! Consolidate chat conversation logs into one deduplicated log whose AI
//! turns carry the live result of the SPARQL query they contain, then mine
//! that log into a (question, query) training corpus.

pub mod catalog;
pub mod config;
pub mod enrich;
pub mod extract;
pub mod limit;
pub mod merge;
pub mod normalize;
pub mod parse;
pub mod sparql;
pub mod stats;
pub mod training;
pub mod types;
