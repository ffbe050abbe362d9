use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event on the chat stream.
///
/// Serialized with a `payload_type` tag; every `message` event carries all
/// seven keys so clients can read them without presence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload_type", rename_all = "snake_case")]
pub enum StreamPayload {
    /// A message appended to the turn.
    Message {
        content: String,
        /// Whether this message declares a tool call.
        function_call: bool,
        function_name: Option<String>,
        /// Parsed call arguments, or the `{"raw", "status": "incomplete"}` marker.
        arguments: Option<Value>,
        /// Whether this message is itself a tool result.
        tool_call: bool,
        tool_name: Option<String>,
    },
    /// A value-level signal about the turn.
    Values {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_answer: Option<String>,
    },
    /// The input was rejected before the turn started.
    ValidationError {
        validator: String,
        outcome: String,
        details: Value,
    },
}

impl StreamPayload {
    pub fn error(message: impl Into<String>) -> Self {
        StreamPayload::Values {
            action: None,
            error: Some(message.into()),
            final_answer: None,
        }
    }

    /// The JSON body of one SSE `data:` line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
