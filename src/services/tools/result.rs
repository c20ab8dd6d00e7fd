//! Tool Results
//!
//! The payload shape returned by backend tools, plus the layered extraction
//! helpers that pull text or structured JSON out of it. Different backend
//! tools wrap their payload differently; callers go through these helpers
//! instead of special-casing per tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Ordered content blocks
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Whether the tool reported a failure
    #[serde(default)]
    pub is_error: bool,
}

/// One content block of a tool result. Backend tools emit several shapes;
/// all are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text { text: String },
    Resource { resource: ResourceBlock },
    Data { data: Value },
}

/// An embedded resource payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: output.into() }],
            is_error: false,
        }
    }

    /// Create a successful structured result
    pub fn data(data: Value) -> Self {
        Self {
            content: vec![ContentBlock::Data { data }],
            is_error: false,
        }
    }

    /// Create an error-shaped result carrying the failure text
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: message.into() }],
            is_error: true,
        }
    }

    /// Extract a structured JSON payload, trying in order: a `data` object,
    /// a `resource.data` object, `resource.text` parsed as JSON, a
    /// top-level `text` parsed as JSON.
    pub fn structured_payload(&self) -> Option<Value> {
        for block in &self.content {
            if let ContentBlock::Data { data } = block {
                if data.is_object() {
                    return Some(data.clone());
                }
            }
        }
        for block in &self.content {
            if let ContentBlock::Resource { resource } = block {
                if let Some(data) = &resource.data {
                    if data.is_object() {
                        return Some(data.clone());
                    }
                }
            }
        }
        for block in &self.content {
            if let ContentBlock::Resource { resource } = block {
                if let Some(text) = &resource.text {
                    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                        return Some(parsed);
                    }
                }
            }
        }
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                    return Some(parsed);
                }
            }
        }
        None
    }

    /// First non-blank raw text carried by the result
    pub fn raw_text(&self) -> Option<String> {
        for block in &self.content {
            let text = match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Resource { resource } => resource.text.as_ref(),
                ContentBlock::Data { .. } => None,
            };
            if let Some(text) = text {
                if !text.trim().is_empty() {
                    return Some(text.clone());
                }
            }
        }
        None
    }

    /// Primary text of the result: for JSON-object text blocks the first
    /// non-empty string value, otherwise the raw text itself.
    pub fn primary_text(&self) -> Option<String> {
        for block in &self.content {
            let text = match block {
                ContentBlock::Text { text } => text,
                ContentBlock::Resource { resource } => match &resource.text {
                    Some(text) => text,
                    None => continue,
                },
                ContentBlock::Data { .. } => continue,
            };
            if text.trim().is_empty() {
                continue;
            }
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
                for value in map.values() {
                    if let Value::String(inner) = value {
                        if !inner.trim().is_empty() {
                            return Some(inner.clone());
                        }
                    }
                }
            }
            return Some(text.clone());
        }
        None
    }

    /// Serialize the result for the conversation transcript: all blocks
    /// rendered as text, joined by newlines.
    pub fn rendered_text(&self) -> String {
        let mut parts = Vec::new();
        for block in &self.content {
            match block {
                ContentBlock::Text { text } => parts.push(text.clone()),
                ContentBlock::Resource { resource } => {
                    if let Some(text) = &resource.text {
                        parts.push(text.clone());
                    } else if let Some(data) = &resource.data {
                        parts.push(pretty(data));
                    }
                }
                ContentBlock::Data { data } => parts.push(pretty(data)),
            }
        }
        let joined = parts.join("\n");
        if joined.trim().is_empty() {
            "(no output)".to_string()
        } else {
            joined
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
