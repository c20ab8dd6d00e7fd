//! Payload Limiter
//!
//! Bounds the size of tool payloads before they enter the conversation
//! transcript or the evidence record, so tool output cannot grow the
//! context without bound. Log-shaped JSON (pod → container → text) is
//! shrunk structurally; everything else gets plain truncation with a
//! marker. Limiting is idempotent: an already-limited payload passes
//! through unchanged.

use serde_json::Value;

use crate::services::tools::result::{ContentBlock, ResourceBlock, ToolResult};

/// Marker appended to truncated text. Its presence also guards against
/// re-truncating an already-limited payload.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Size policy applied to tool payloads
#[derive(Debug, Clone)]
pub struct PayloadLimiter {
    /// Character ceiling for plain text payloads
    pub max_text_chars: usize,
    /// Pods retained from a structured log payload
    pub max_pods: usize,
    /// Containers retained per pod
    pub max_containers: usize,
    /// Character ceiling per retained container
    pub max_container_chars: usize,
}

impl Default for PayloadLimiter {
    fn default() -> Self {
        Self {
            max_text_chars: 4000,
            max_pods: 1,
            max_containers: 1,
            max_container_chars: 2000,
        }
    }
}

impl PayloadLimiter {
    /// Apply the size policy to every content block of a tool result
    pub fn limit(&self, result: &ToolResult) -> ToolResult {
        ToolResult {
            content: result.content.iter().map(|b| self.limit_block(b)).collect(),
            is_error: result.is_error,
        }
    }

    fn limit_block(&self, block: &ContentBlock) -> ContentBlock {
        match block {
            ContentBlock::Text { text } => ContentBlock::Text {
                text: self.limit_text(text),
            },
            ContentBlock::Resource { resource } => ContentBlock::Resource {
                resource: ResourceBlock {
                    text: resource.text.as_deref().map(|t| self.limit_text(t)),
                    data: resource
                        .data
                        .as_ref()
                        .map(|d| self.shrink_log_value(d).unwrap_or_else(|| d.clone())),
                },
            },
            ContentBlock::Data { data } => ContentBlock::Data {
                data: self.shrink_log_value(data).unwrap_or_else(|| data.clone()),
            },
        }
    }

    /// Limit one text payload: structural shrink when it is log-shaped
    /// JSON, plain truncation otherwise.
    pub fn limit_text(&self, text: &str) -> String {
        if let Some(shrunk) = self.shrink_log_text(text) {
            return shrunk;
        }
        truncate_with_marker(text, self.max_text_chars)
    }

    fn shrink_log_text(&self, text: &str) -> Option<String> {
        let value: Value = serde_json::from_str(text).ok()?;
        let shrunk = self.shrink_log_value(&value)?;
        serde_json::to_string_pretty(&shrunk).ok()
    }

    /// Structurally shrink a log-shaped value (a mapping keyed by pod, each
    /// value a mapping keyed by container, each leaf a string): retain the
    /// first pods and containers in key order and truncate each retained
    /// leaf. Returns None when the value is not log-shaped.
    pub fn shrink_log_value(&self, value: &Value) -> Option<Value> {
        let pods = value.as_object()?;
        if pods.is_empty() {
            return None;
        }
        let mut parsed: Vec<(&String, Vec<(&String, &str)>)> = Vec::new();
        for (pod, containers) in pods {
            let containers = containers.as_object()?;
            let mut leaves = Vec::new();
            for (container, leaf) in containers {
                leaves.push((container, leaf.as_str()?));
            }
            parsed.push((pod, leaves));
        }

        let mut kept_pods = serde_json::Map::new();
        for (pod, containers) in parsed.into_iter().take(self.max_pods) {
            let mut kept = serde_json::Map::new();
            for (container, text) in containers.into_iter().take(self.max_containers) {
                kept.insert(
                    container.clone(),
                    Value::String(truncate_with_marker(text, self.max_container_chars)),
                );
            }
            kept_pods.insert(pod.clone(), Value::Object(kept));
        }
        Some(Value::Object(kept_pods))
    }
}

/// Truncate text to a character ceiling, appending the truncation marker.
/// Text already carrying the marker is returned unchanged so repeated
/// limiting cannot shrink a payload further.
fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if text.ends_with(TRUNCATION_MARKER) {
        return text.to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}
