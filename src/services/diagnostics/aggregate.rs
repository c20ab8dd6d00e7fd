//! Result Aggregation
//!
//! Classifies tool output by the tool's unqualified name and folds it into
//! the evidence record. Error-shaped results are never aggregated; they
//! exist only as transcript data for the LLM.

use std::collections::BTreeMap;

use serde_json::Value;

use super::catalog::simple_name;
use crate::models::diagnostics::IssueRef;
use crate::models::evidence::{CollectedEvidence, LogPayload};
use crate::services::tools::result::ToolResult;

/// Conventional tool names this core expects from the backends
pub const LOG_TOOL: &str = "get_logs";
pub const EVENTS_TOOL: &str = "get_events";
pub const ISSUE_TOOL: &str = "create_issue";
pub const SLACK_TOOL: &str = "slack_post_message";
const DESCRIBE_PREFIX: &str = "describe_";

/// Resource-describe tool for a resource type, when one is conventionally
/// defined for it
pub fn describe_tool_for(resource_type: &str) -> Option<&'static str> {
    match resource_type.to_ascii_lowercase().as_str() {
        "deployment" => Some("describe_deployment"),
        "pod" => Some("describe_pod"),
        "service" => Some("describe_service"),
        _ => None,
    }
}

/// Fold one tool result into the evidence record
pub fn record_tool_result(evidence: &mut CollectedEvidence, tool_name: &str, result: &ToolResult) {
    if result.is_error {
        return;
    }

    match simple_name(tool_name) {
        LOG_TOOL => {
            if let Some(payload) = log_payload_from(result) {
                evidence.merge_logs(payload);
            }
        }
        EVENTS_TOOL => {
            if let Some(text) = extracted_text(result) {
                evidence.events = Some(text);
            }
        }
        ISSUE_TOOL => {
            if let Some(issue) = parse_issue(result) {
                evidence.issue = Some(issue);
            }
        }
        SLACK_TOOL => {
            evidence.slack_result = result
                .structured_payload()
                .or_else(|| result.raw_text().map(Value::String));
        }
        name if name.starts_with(DESCRIBE_PREFIX) => {
            if let Some(text) = extracted_text(result) {
                evidence.resource = Some(text);
            }
        }
        _ => {}
    }
}

/// Parse the issue-creation response into an issue reference
pub fn parse_issue(result: &ToolResult) -> Option<IssueRef> {
    let payload = result.structured_payload()?;
    let object = payload.as_object()?;
    let html_url = object
        .get("html_url")
        .or_else(|| object.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let number = object.get("number").and_then(Value::as_i64);
    if html_url.is_none() && number.is_none() {
        return None;
    }
    Some(IssueRef { html_url, number })
}

/// Extracted text for resource/event evidence: a structured payload is
/// stringified, anything else falls back to the raw text.
fn extracted_text(result: &ToolResult) -> Option<String> {
    if let Some(payload) = result.structured_payload() {
        return Some(match payload {
            Value::String(text) => text,
            other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
        });
    }
    result.raw_text()
}

/// Interpret a log-fetch result: a pod → container → text object becomes a
/// structured payload; anything else is kept as raw text.
fn log_payload_from(result: &ToolResult) -> Option<LogPayload> {
    if let Some(payload) = result.structured_payload() {
        if let Some(structured) = as_structured_logs(&payload) {
            return Some(LogPayload::Structured(structured));
        }
        return Some(LogPayload::Text(
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
        ));
    }
    result.raw_text().map(LogPayload::Text)
}

fn as_structured_logs(value: &Value) -> Option<BTreeMap<String, BTreeMap<String, String>>> {
    let pods = value.as_object()?;
    if pods.is_empty() {
        return None;
    }
    let mut out = BTreeMap::new();
    for (pod, containers) in pods {
        let containers = containers.as_object()?;
        let mut inner = BTreeMap::new();
        for (container, text) in containers {
            inner.insert(container.clone(), text.as_str()?.to_string());
        }
        out.insert(pod.clone(), inner);
    }
    Some(out)
}
