//! Read-only inspection of buffered chat-completion responses for logging.

use serde_json::Value;

/// Where reasoning showed up in a chat-completion response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningMarkers {
    /// A choice message carries a `reasoning` or `reasoning_content` field.
    pub reasoning_field: bool,
    /// A choice message's content contains `<think>` / `</think>` tags.
    pub think_tags: bool,
}

impl ReasoningMarkers {
    pub fn any(&self) -> bool {
        self.reasoning_field || self.think_tags
    }
}

/// Scan `choices[].message` of a JSON response body. Non-JSON bodies and
/// bodies without choices yield no markers.
pub fn reasoning_markers(body: &[u8]) -> ReasoningMarkers {
    let mut markers = ReasoningMarkers::default();
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return markers;
    };
    let Some(choices) = value.get("choices").and_then(Value::as_array) else {
        return markers;
    };

    for message in choices.iter().filter_map(|c| c.get("message")) {
        if message.get("reasoning").is_some_and(|r| !r.is_null())
            || message.get("reasoning_content").is_some_and(|r| !r.is_null())
        {
            markers.reasoning_field = true;
        }
        if let Some(content) = message.get("content").and_then(Value::as_str)
            && (content.contains("<think>") || content.contains("</think>"))
        {
            markers.think_tags = true;
        }
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasoning_field_detected() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "4", "reasoning": "2+2"}}]
        });
        let markers = reasoning_markers(body.to_string().as_bytes());
        assert!(markers.reasoning_field);
        assert!(!markers.think_tags);

        let body = json!({
            "choices": [{"message": {"content": "x", "reasoning_content": "because"}}]
        });
        assert!(reasoning_markers(body.to_string().as_bytes()).reasoning_field);
    }

    #[test]
    fn test_think_tags_detected() {
        let body = json!({
            "choices": [{"message": {"content": "<think>hmm</think>answer"}}]
        });
        let markers = reasoning_markers(body.to_string().as_bytes());
        assert!(markers.think_tags);
        assert!(markers.any());
    }

    #[test]
    fn test_plain_and_non_json_bodies() {
        let body = json!({"choices": [{"message": {"content": "hi", "reasoning": null}}]});
        assert!(!reasoning_markers(body.to_string().as_bytes()).any());
        assert!(!reasoning_markers(b"upstream exploded").any());
        assert!(!reasoning_markers(br#"{"data": []}"#).any());
    }
}
