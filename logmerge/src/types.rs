use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a SPARQL result set: variable name -> RDF term object.
pub type Binding = Map<String, Value>;

/// Outcome of executing the query found in one AI turn. Serialized into the
/// turn under `query_results` and never touched again.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QueryResult {
    pub question: String,
    pub sparql_query: String,
    pub sparql_endpoint: String,
    pub results: Vec<Binding>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Human,
    Ai,
    Other,
}

impl TurnKind {
    pub fn of(turn: &Value) -> Self {
        match turn.get("type").and_then(Value::as_str) {
            Some("human") => Self::Human,
            Some("ai") => Self::Ai,
            _ => Self::Other,
        }
    }
}

/// One line of the training corpus.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrainingRecord {
    pub prompt: Vec<PromptMessage>,
    pub solution: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PromptMessage {
    pub content: String,
    pub role: String,
}

impl TrainingRecord {
    pub fn from_query_result(result: &QueryResult) -> Self {
        Self {
            prompt: vec![PromptMessage {
                content: result.question.clone(),
                role: "user".to_string(),
            }],
            solution: result.sparql_query.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_result_serializes_null_error() {
        let qr = QueryResult {
            question: "q".to_string(),
            sparql_query: "SELECT * WHERE { ?s ?p ?o }\nLIMIT 50".to_string(),
            sparql_endpoint: "https://example.org/sparql".to_string(),
            results: vec![],
            error: None,
        };
        let value = serde_json::to_value(&qr).unwrap();
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["results"], json!([]));
    }

    #[test]
    fn turn_kind_reads_type_field() {
        assert_eq!(TurnKind::of(&json!({"type": "human"})), TurnKind::Human);
        assert_eq!(TurnKind::of(&json!({"type": "ai"})), TurnKind::Ai);
        assert_eq!(TurnKind::of(&json!({"type": "tool"})), TurnKind::Other);
        assert_eq!(TurnKind::of(&json!({"content": "x"})), TurnKind::Other);
    }

    #[test]
    fn training_record_shape() {
        let qr = QueryResult {
            question: "What is X?".to_string(),
            sparql_query: "SELECT ?x WHERE { ?x a ?t }".to_string(),
            sparql_endpoint: "https://example.org/sparql".to_string(),
            results: vec![],
            error: None,
        };
        let rec = TrainingRecord::from_query_result(&qr);
        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            json!({
                "prompt": [{"content": "What is X?", "role": "user"}],
                "solution": "SELECT ?x WHERE { ?x a ?t }"
            })
        );
    }
}
