//! LLM Conversation Types
//!
//! Core types for the tool-calling conversation: the role-tagged transcript
//! message, the tool definitions the model may call, and the completion
//! turn returned by a chat backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::RawToolCall;

/// A message in the conversation transcript.
///
/// Ordering is append-only and significant: the transcript is replayed
/// verbatim on every loop iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<RawToolCall>,
    },
    Tool {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { content: text.into() }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { content: text.into() }
    }

    /// Create a plain assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create a tool result message correlated to the originating call
    pub fn tool_result(
        tool_call_id: Option<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_call_id,
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Definition of a tool exposed to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model must use to call the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's input parameters
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
}

/// The schema used when a tool reports none
pub fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// One completion turn from the chat backend.
///
/// `content` may arrive as a plain string or as a list of content blocks,
/// depending on the backend SDK; `text()` flattens both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub tool_calls: Vec<RawToolCall>,
}

impl ChatTurn {
    /// Create a text-only turn
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            content: Value::String(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create a turn carrying tool calls
    pub fn with_tool_calls(text: Option<&str>, tool_calls: Vec<RawToolCall>) -> Self {
        Self {
            content: text.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null),
            tool_calls,
        }
    }

    /// Visible text of the turn, or None when the turn carries no text.
    ///
    /// Flattens list-shaped content by joining the `text` field of each
    /// block; blank content counts as absent.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Value::String(text) => {
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text.clone())
                }
            }
            Value::Array(blocks) => {
                let joined = blocks
                    .iter()
                    .filter_map(|block| match block {
                        Value::String(text) => Some(text.as_str()),
                        Value::Object(map) => map.get("text").and_then(Value::as_str),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                if joined.trim().is_empty() {
                    None
                } else {
                    Some(joined)
                }
            }
            _ => None,
        }
    }

    /// Whether the turn requested any tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
