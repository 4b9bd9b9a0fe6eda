//! Raw log line -> canonical record, or the reason it was rejected.
//!
//! Producers sometimes store `input`/`output` as JSON-encoded strings. Those
//! are decoded in place; a string that fails to decode rejects the whole
//! record rather than passing the raw text through.

use crate::catalog::Catalog;
use crate::parse::{content_text, timestamp_key};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The line is not JSON at all.
    Unparseable(String),
    /// Valid JSON, but not an object / `output` or `messages` of the wrong shape.
    Malformed(String),
    /// `input` was a string that does not decode as JSON.
    MalformedInput(String),
    /// `output` was a string that does not decode as JSON.
    MalformedOutput(String),
    /// No `output`, or an empty `output.messages`.
    NoOutput,
    /// A canned example question and its answer, not real traffic.
    ExampleOnly,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable(e) => write!(f, "unparseable line: {e}"),
            Self::Malformed(e) => write!(f, "malformed record: {e}"),
            Self::MalformedInput(e) => write!(f, "failed to parse 'input' JSON string: {e}"),
            Self::MalformedOutput(e) => write!(f, "failed to parse 'output' JSON string: {e}"),
            Self::NoOutput => f.write_str("no output messages"),
            Self::ExampleOnly => f.write_str("example question only"),
        }
    }
}

/// A decoded log record whose `output.messages` is a non-empty array.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    pub fn timestamp_key(&self) -> Option<String> {
        timestamp_key(self.fields.get("timestamp"))
    }

    pub fn messages(&self) -> &[Value] {
        self.fields
            .get("output")
            .and_then(|o| o.get("messages"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn messages_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.fields
            .get_mut("output")
            .and_then(Value::as_object_mut)
            .and_then(|o| o.get_mut("messages"))
            .and_then(Value::as_array_mut)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Compact JSON, non-ASCII kept literal, without the trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.fields)
    }
}

pub fn normalize_line(line: &str, catalog: &Catalog) -> Result<LogRecord, Rejection> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| Rejection::Unparseable(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(Rejection::Malformed("record is not a JSON object".to_string()));
    };

    if let Some(Value::String(raw)) = fields.get("input") {
        let decoded: Value =
            serde_json::from_str(raw).map_err(|e| Rejection::MalformedInput(e.to_string()))?;
        fields.insert("input".to_string(), decoded);
    }

    if let Some(Value::String(raw)) = fields.get("output") {
        let decoded: Value =
            serde_json::from_str(raw).map_err(|e| Rejection::MalformedOutput(e.to_string()))?;
        fields.insert("output".to_string(), decoded);
    }

    let messages = match fields.get("output") {
        None | Some(Value::Null) => return Err(Rejection::NoOutput),
        Some(Value::Object(output)) => match output.get("messages") {
            None | Some(Value::Null) => return Err(Rejection::NoOutput),
            Some(Value::Array(messages)) => messages,
            Some(_) => {
                return Err(Rejection::Malformed(
                    "output.messages is not an array".to_string(),
                ))
            }
        },
        Some(_) => return Err(Rejection::Malformed("output is not an object".to_string())),
    };

    if messages.is_empty() {
        return Err(Rejection::NoOutput);
    }
    if messages.len() == 2 && catalog.is_example_question(&content_text(&messages[0])) {
        return Err(Rejection::ExampleOnly);
    }

    Ok(LogRecord { fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(value: Value) -> Result<LogRecord, Rejection> {
        normalize_line(&value.to_string(), &Catalog::default())
    }

    fn conversation(first: &str, turns: usize) -> Value {
        let mut messages = vec![json!({"type": "human", "content": first})];
        for i in 1..turns {
            let kind = if i % 2 == 1 { "ai" } else { "human" };
            messages.push(json!({"type": kind, "content": format!("turn {i}")}));
        }
        json!({"timestamp": "t1", "output": {"messages": messages}})
    }

    #[test]
    fn rejects_non_json() {
        let err = normalize_line("not json at all", &Catalog::default()).unwrap_err();
        assert!(matches!(err, Rejection::Unparseable(_)));
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(norm(json!([1, 2])), Err(Rejection::Malformed(_))));
        assert!(matches!(
            norm(json!({"timestamp": "t", "output": 3})),
            Err(Rejection::Malformed(_))
        ));
    }

    #[test]
    fn decodes_stringified_input_and_output() {
        let output = json!({"messages": [{"type": "human", "content": "hi"}]}).to_string();
        let input = json!({"question": "hi"}).to_string();
        let record = norm(json!({"timestamp": "t1", "input": input, "output": output})).unwrap();
        assert_eq!(record.fields()["input"], json!({"question": "hi"}));
        assert_eq!(record.messages().len(), 1);
    }

    #[test]
    fn malformed_input_string_skips_record() {
        let err = norm(json!({
            "timestamp": "t1",
            "input": "{not json",
            "output": {"messages": [{"type": "human", "content": "hi"}]}
        }))
        .unwrap_err();
        assert!(matches!(err, Rejection::MalformedInput(_)));
    }

    #[test]
    fn malformed_output_string_skips_record() {
        let err = norm(json!({
            "timestamp": "t1",
            "output": "ValueError: EOF while parsing a value at line 2 column 0"
        }))
        .unwrap_err();
        assert!(matches!(err, Rejection::MalformedOutput(_)));
    }

    #[test]
    fn missing_null_or_empty_output_is_no_output() {
        assert_eq!(norm(json!({"timestamp": "t1"})), Err(Rejection::NoOutput));
        assert_eq!(
            norm(json!({"timestamp": "t1", "output": null})),
            Err(Rejection::NoOutput)
        );
        assert_eq!(
            norm(json!({"timestamp": "t1", "output": "null"})),
            Err(Rejection::NoOutput)
        );
        assert_eq!(
            norm(json!({"timestamp": "t1", "output": {"messages": []}})),
            Err(Rejection::NoOutput)
        );
    }

    #[test]
    fn two_message_example_is_filtered() {
        let err = norm(conversation("What is the HGNC symbol for the P68871 protein?", 2));
        assert_eq!(err, Err(Rejection::ExampleOnly));
        let padded = norm(conversation("  Where is the ACE2 gene expressed in humans?  ", 2));
        assert_eq!(padded, Err(Rejection::ExampleOnly));
    }

    #[test]
    fn trailing_space_example_entry_is_filtered() {
        // Deliberately broader than exact matching: the catalog entry ends in a
        // space that trimmed content can never carry.
        let err = norm(conversation("Which SIB resources are supported by ExpasyGPT?", 2));
        assert_eq!(err, Err(Rejection::ExampleOnly));
    }

    #[test]
    fn example_with_follow_up_is_kept() {
        let record = norm(conversation("What is the HGNC symbol for the P68871 protein?", 3));
        assert!(record.is_ok());
        let record = norm(conversation("What is the HGNC symbol for the P68871 protein?", 4));
        assert!(record.is_ok());
    }

    #[test]
    fn real_question_with_two_messages_is_kept() {
        let record = norm(conversation("What is the HGNC symbol for BRCA2?", 2)).unwrap();
        assert_eq!(record.timestamp_key(), Some("s:t1".to_string()));
    }

    #[test]
    fn json_line_keeps_field_order_and_unicode() {
        let line = r#"{"timestamp":"t1","zeta":1,"alpha":"café","output":{"messages":[{"type":"human","content":"é"}]}}"#;
        let record = normalize_line(line, &Catalog::default()).unwrap();
        assert_eq!(record.to_json_line().unwrap(), line);
    }
}
