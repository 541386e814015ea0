use serde::{Deserialize, Serialize};
use serde_json::Value;

use farol_core::{sanitize_history, HistoryItem, Role};

/// Chat stream request body. History entries arrive as loose JSON and
/// go through a validating parse; malformed entries are dropped rather
/// than failing the request.
#[derive(Debug, Deserialize)]
pub struct ChatStreamRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<Value>,
    #[serde(default)]
    pub mode: String,
}

impl ChatStreamRequest {
    /// Validated history window: well-formed entries only, trimmed,
    /// non-empty, capped to the last 12.
    pub fn sanitized_history(&self) -> Vec<HistoryItem> {
        let items = self
            .history
            .iter()
            .filter_map(|value| {
                let role = match value.get("role").and_then(Value::as_str) {
                    Some("user") => Role::User,
                    Some("assistant") => Role::Assistant,
                    _ => return None,
                };
                let content = value.get("content").and_then(Value::as_str)?;
                Some(HistoryItem {
                    role,
                    content: content.to_string(),
                })
            })
            .collect();
        sanitize_history(items)
    }
}

/// One line of the NDJSON response stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamLine {
    Meta {
        #[serde(rename = "skillsUsed")]
        skills_used: Vec<String>,
    },
    Delta {
        text: String,
    },
    Done,
    Error {
        error: String,
    },
}

impl StreamLine {
    /// Serialize as one newline-terminated JSON line.
    pub fn to_ndjson(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| {
            // A serialization failure here would be a programming error;
            // emit a well-formed error line rather than corrupt framing
            r#"{"type":"error","error":"serialization failure"}"#.to_string()
        });
        line.push('\n');
        line
    }
}

/// Split answer text into fixed-size delivery chunks on char
/// boundaries. Chunk boundaries carry no semantic meaning.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stream_lines_serialize_to_wire_shape() {
        let meta = StreamLine::Meta {
            skills_used: vec!["mode:coder".into()],
        };
        assert_eq!(
            meta.to_ndjson(),
            "{\"type\":\"meta\",\"skillsUsed\":[\"mode:coder\"]}\n"
        );
        assert_eq!(StreamLine::Done.to_ndjson(), "{\"type\":\"done\"}\n");
    }

    #[test]
    fn chunking_reassembles_exactly() {
        let text = "não é só ascii — ";
        let text = text.repeat(13);
        let chunks = chunk_text(&text, 80);
        assert!(chunks.iter().all(|c| c.chars().count() <= 80));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn malformed_history_entries_are_dropped() {
        let request = ChatStreamRequest {
            message: "hi".into(),
            history: vec![
                json!({"role": "user", "content": "keep me"}),
                json!({"role": "system", "content": "wrong role"}),
                json!({"role": "assistant", "content": 42}),
                json!("not an object"),
                json!({"role": "assistant", "content": "   "}),
            ],
            mode: String::new(),
        };
        let history = request.sanitized_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "keep me");
    }
}
