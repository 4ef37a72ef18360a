//! Uniform response wrapper returned by every tool.

use crate::jobs::types::Outcome;
use rmcp::model::CallToolResult;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Content type of an envelope payload; only text is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain or JSON-encoded text.
    #[default]
    Text,
}

/// Payload of a [`ResponseEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeContent {
    /// Always `text`.
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Tool output or error message.
    pub text: String,
}

/// `{ "isError": bool, "content": { "type": "text", "text": string } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Whether `content.text` describes a failure.
    pub is_error: bool,
    /// Output payload.
    pub content: EnvelopeContent,
}

impl ResponseEnvelope {
    /// Successful response carrying `text`.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(false, text.into())
    }

    /// Failed response carrying the error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(true, message.into())
    }

    /// Render a reconciled outcome; errors are flagged and rendered as a JSON array.
    pub fn from_outcome<D: Serialize>(outcome: &Outcome<D>) -> Result<Self, serde_json::Error> {
        let text = serde_json::to_string(outcome)?;
        Ok(Self::new(outcome.is_error(), text))
    }

    /// Successful response carrying `value` encoded as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::success(serde_json::to_string(value)?))
    }

    fn new(is_error: bool, text: String) -> Self {
        Self {
            is_error,
            content: EnvelopeContent {
                kind: ContentKind::Text,
                text,
            },
        }
    }

    /// JSON form of the envelope.
    pub fn to_value(&self) -> Value {
        json!({
            "isError": self.is_error,
            "content": {
                "type": "text",
                "text": self.content.text,
            }
        })
    }

    /// Convert into an MCP tool result, flagging failures.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let value = self.to_value();
        if self.is_error {
            CallToolResult::structured_error(value)
        } else {
            CallToolResult::structured(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{ReportedError, ServiceError};

    #[test]
    fn serializes_to_wire_shape() {
        let envelope = ResponseEnvelope::success("[]");
        assert_eq!(
            serde_json::to_value(&envelope).expect("serialize"),
            json!({ "isError": false, "content": { "type": "text", "text": "[]" } })
        );
        assert_eq!(serde_json::to_value(&envelope).expect("serialize"), envelope.to_value());
    }

    #[test]
    fn error_outcomes_are_flagged() {
        let outcome: Outcome<Value> = Outcome::Errors(vec![ReportedError::Job(ServiceError {
            code: "InvalidRequest".into(),
            message: "Bad input".into(),
            target: None,
            inner_error: None,
        })]);
        let envelope = ResponseEnvelope::from_outcome(&outcome).expect("render");
        assert!(envelope.is_error);
        let rendered: Value = serde_json::from_str(&envelope.content.text).expect("json text");
        assert_eq!(rendered, json!([{ "code": "InvalidRequest", "message": "Bad input" }]));
    }

    #[test]
    fn failures_become_error_tool_results() {
        let result = ResponseEnvelope::failure("Invalid response format.").into_call_tool_result();
        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.expect("structured content");
        assert_eq!(structured["content"]["text"], "Invalid response format.");
    }
}
