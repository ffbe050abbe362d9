use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal tool call format (provider-agnostic).
/// Every adapter converts provider-specific tool calls to/from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

impl ToolCall {
    /// True when the arguments could not be parsed as JSON.
    pub fn has_incomplete_arguments(&self) -> bool {
        is_incomplete(&self.arguments)
    }
}

/// Tool definition exposed to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

/// A message in the conversation (provider-agnostic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        tool_name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    /// Marks a turn that ended because the model call failed.
    #[serde(rename = "error")]
    Error { message: String },
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: MessageContent::Text(text.into()) }
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: MessageContent::Text(text.into()) }
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: MessageContent::Text(text.into()) }
    }

    /// An assistant message carrying the model's text plus its tool calls.
    pub fn assistant_with_calls(text: impl Into<String>, calls: &[ToolCall]) -> Self {
        let text = text.into();
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            parts.push(ContentPart::Text { text });
        }
        parts.extend(calls.iter().map(|c| ContentPart::ToolUse {
            id: c.call_id.clone(),
            name: c.tool_name.clone(),
            input: c.arguments.clone(),
        }));
        Self { role: Role::Assistant, content: MessageContent::Parts(parts) }
    }

    pub fn tool_result(
        tool_use_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_use_id: tool_use_id.into(),
                tool_name: tool_name.into(),
                content: content.into(),
                is_error,
            }]),
        }
    }

    /// A system-role message carrying an `error` marker.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Parts(vec![ContentPart::Error { message: message.into() }]),
        }
    }

    /// Tool calls declared by this message, in order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolUse { id, name, input } => Some(ToolCall {
                        call_id: id.clone(),
                        tool_name: name.clone(),
                        arguments: input.clone(),
                    }),
                    _ => None,
                })
                .collect(),
        }
    }

    /// `(call_id, tool_name, content, is_error)` of the tool result part, if any.
    pub fn tool_result_part(&self) -> Option<(&str, &str, &str, bool)> {
        match &self.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::ToolResult { tool_use_id, tool_name, content, is_error } => {
                    Some((tool_use_id.as_str(), tool_name.as_str(), content.as_str(), *is_error))
                }
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }

    /// The error marker text, if this message is an error message.
    pub fn error_message(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Error { message } => Some(message.as_str()),
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }
}

impl MessageContent {
    /// Extract the plain-text content (first text part, or the full text).
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t.as_str()),
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }

    /// Concatenate every textual part, including tool results and errors.
    pub fn extract_all_text(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ToolResult { content, .. } => Some(content.as_str()),
                    ContentPart::Error { message } => Some(message.as_str()),
                    ContentPart::ToolUse { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Argument parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse raw function-call argument text.
///
/// Text that is not valid JSON is kept as
/// `{"raw": <text>, "status": "incomplete"}` rather than dropped.
pub fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| {
        serde_json::json!({
            "raw": raw,
            "status": "incomplete",
        })
    })
}

/// True when `args` is the incomplete marker produced by [`parse_arguments`].
pub fn is_incomplete(args: &Value) -> bool {
    args.get("status").and_then(|s| s.as_str()) == Some("incomplete") && args.get("raw").is_some()
}
