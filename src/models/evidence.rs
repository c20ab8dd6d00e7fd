//! Collected Evidence
//!
//! Accumulator for the artifacts a diagnostics run gathers. Mutated in
//! place as tool results arrive; log payloads merge across calls instead of
//! clobbering each other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diagnostics::IssueRef;

/// Logs gathered for a service: either a flat text payload or a structured
/// pod → container → text mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogPayload {
    Structured(BTreeMap<String, BTreeMap<String, String>>),
    Text(String),
}

/// Evidence gathered during one diagnostics run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedEvidence {
    /// Log payload; merged across multiple log-fetch calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<LogPayload>,
    /// Resource description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Recent events text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
    /// Tracking issue created during the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueRef>,
    /// Raw response from the chat-post tool, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_result: Option<Value>,
}

impl CollectedEvidence {
    /// Merge a new log payload into the accumulator.
    ///
    /// Structured payloads merge by pod key: new pods are added and an
    /// existing pod's containers are extended, overwriting on a container
    /// key collision. Any other shape combination replaces the slot.
    pub fn merge_logs(&mut self, incoming: LogPayload) {
        match (&mut self.logs, incoming) {
            (Some(LogPayload::Structured(existing)), LogPayload::Structured(new_pods)) => {
                for (pod, containers) in new_pods {
                    existing.entry(pod).or_default().extend(containers);
                }
            }
            (slot, incoming) => {
                *slot = Some(incoming);
            }
        }
    }

    /// Whether no evidence has been collected yet
    pub fn is_empty(&self) -> bool {
        self.logs.is_none()
            && self.resource.is_none()
            && self.events.is_none()
            && self.issue.is_none()
            && self.slack_result.is_none()
    }

    /// Derive a bounded log snippet from the collected logs: the last
    /// `max_lines` lines of the text payload, or of the first pod's first
    /// container for structured payloads.
    pub fn log_snippet(&self, max_lines: usize) -> Option<String> {
        let text = match self.logs.as_ref()? {
            LogPayload::Text(text) => text.clone(),
            LogPayload::Structured(pods) => pods
                .values()
                .next()
                .and_then(|containers| containers.values().next())
                .cloned()?,
        };
        if text.trim().is_empty() {
            return None;
        }
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(max_lines);
        Some(lines[start..].join("\n"))
    }
}
