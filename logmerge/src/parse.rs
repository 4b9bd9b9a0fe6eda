use serde_json::Value;

/// Plain text of a turn's `content`, which is either a string or a list of
/// content parts (strings or `{type, text}` objects).
pub fn content_text(turn: &Value) -> String {
    turn.get("content")
        .and_then(|c| flatten_text(c, 0))
        .unwrap_or_default()
}

fn flatten_text(value: &Value, depth: usize) -> Option<String> {
    if depth > 6 {
        return None;
    }
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| flatten_text(item, depth + 1))
                .filter(|text| !text.is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(""))
            }
        }
        Value::Object(map) => ["text", "content"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| flatten_text(v, depth + 1)),
        _ => None,
    }
}

/// Dedup key for a record's `timestamp`. Falsy values (null, "", 0, false,
/// empty containers) mean the record has no usable key.
pub fn timestamp_key(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let present = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    };
    if !present {
        return None;
    }
    match value {
        Value::String(s) => Some(format!("s:{s}")),
        other => Some(format!("j:{other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_text_reads_plain_string() {
        assert_eq!(content_text(&json!({"content": "hello"})), "hello");
    }

    #[test]
    fn content_text_flattens_parts() {
        let turn = json!({
            "content": [
                {"type": "text", "text": "first "},
                "second",
                {"type": "image_url", "image_url": {"url": "x"}}
            ]
        });
        assert_eq!(content_text(&turn), "first second");
    }

    #[test]
    fn content_text_missing_is_empty() {
        assert_eq!(content_text(&json!({"type": "ai"})), "");
        assert_eq!(content_text(&json!({"content": 42})), "");
    }

    #[test]
    fn timestamp_key_rejects_falsy_values() {
        assert_eq!(timestamp_key(None), None);
        assert_eq!(timestamp_key(Some(&json!(null))), None);
        assert_eq!(timestamp_key(Some(&json!(""))), None);
        assert_eq!(timestamp_key(Some(&json!(0))), None);
        assert_eq!(timestamp_key(Some(&json!(false))), None);
        assert_eq!(timestamp_key(Some(&json!([]))), None);
    }

    #[test]
    fn timestamp_key_distinguishes_string_and_number() {
        let s = timestamp_key(Some(&json!("1"))).unwrap();
        let n = timestamp_key(Some(&json!(1))).unwrap();
        assert_ne!(s, n);
        assert_eq!(
            timestamp_key(Some(&json!("2025-06-01T10:00:00Z"))),
            timestamp_key(Some(&json!("2025-06-01T10:00:00Z")))
        );
    }
}
