//! Fallback Orchestrator
//!
//! The deterministic, no-LLM path. Reproduces the gather-and-report
//! workflow when the LLM path is unavailable or inconclusive: fetch a
//! bounded log snippet, describe the resource, fetch recent events,
//! synthesize a fixed-template summary, post the notification, and open a
//! tracking issue only if the run does not already have one. Every step is
//! best-effort; a failure yields an empty or placeholder value, never an
//! aborted run.

use serde_json::{json, Value};
use tracing::{info, warn};

use super::aggregate::{
    describe_tool_for, parse_issue, EVENTS_TOOL, ISSUE_TOOL, LOG_TOOL, SLACK_TOOL,
};
use crate::config::DiagnosticsConfig;
use crate::models::evidence::{CollectedEvidence, LogPayload};
use crate::services::tools::session::ToolBackend;

/// Snippet placeholder when the log tool is missing or its call failed
pub const LOG_SNIPPET_PLACEHOLDER: &str = "log snippet unavailable";

/// Lines kept in the log snippet
pub const LOG_SNIPPET_LINES: usize = 40;

/// Identity of one run's target, shared by the fallback steps
pub struct FallbackTarget<'a> {
    pub service: &'a str,
    pub namespace: &'a str,
    pub resource_type: &'a str,
}

/// The deterministic gather-and-report path
pub struct FallbackOrchestrator<'a> {
    tools: &'a dyn ToolBackend,
    config: &'a DiagnosticsConfig,
}

impl<'a> FallbackOrchestrator<'a> {
    pub fn new(tools: &'a dyn ToolBackend, config: &'a DiagnosticsConfig) -> Self {
        Self { tools, config }
    }

    /// Gather whatever evidence the LLM path did not produce, in order:
    /// logs, resource description, recent events. Returns the log snippet
    /// (or its placeholder) when the log step ran.
    pub async fn gather(
        &self,
        target: &FallbackTarget<'_>,
        evidence: &mut CollectedEvidence,
    ) -> Option<String> {
        let snippet = self.collect_log_snippet(target, evidence).await;
        if evidence.resource.is_none() {
            self.collect_resource_description(target, evidence).await;
        }
        if evidence.events.is_none() {
            self.collect_recent_events(target, evidence).await;
        }
        snippet
    }

    async fn collect_log_snippet(
        &self,
        target: &FallbackTarget<'_>,
        evidence: &mut CollectedEvidence,
    ) -> Option<String> {
        if evidence.logs.is_some() {
            return None;
        }
        if !self.tools.has_tool(LOG_TOOL) {
            return Some(LOG_SNIPPET_PLACEHOLDER.to_string());
        }

        let arguments = json!({
            "resourceType": target.resource_type,
            "name": target.service,
            "namespace": target.namespace,
            "tail": self.config.log_tail,
        });
        let text = match self.tools.call_tool(LOG_TOOL, arguments).await {
            Ok(result) if !result.is_error => result.primary_text(),
            Ok(result) => {
                warn!(
                    service = target.service,
                    "log tool reported an error: {}",
                    result.raw_text().unwrap_or_default()
                );
                None
            }
            Err(e) => {
                warn!(service = target.service, "failed to retrieve logs: {e}");
                None
            }
        };

        match text {
            Some(text) if !text.trim().is_empty() => {
                let snippet = last_lines(&text, LOG_SNIPPET_LINES);
                evidence.merge_logs(LogPayload::Text(text));
                Some(snippet)
            }
            _ => Some(LOG_SNIPPET_PLACEHOLDER.to_string()),
        }
    }

    async fn collect_resource_description(
        &self,
        target: &FallbackTarget<'_>,
        evidence: &mut CollectedEvidence,
    ) {
        let tool = match describe_tool_for(target.resource_type) {
            Some(tool) if self.tools.has_tool(tool) => tool,
            _ => return,
        };

        let arguments = json!({
            "name": target.service,
            "namespace": target.namespace,
        });
        match self.tools.call_tool(tool, arguments).await {
            Ok(result) if !result.is_error => {
                if let Some(text) = result.primary_text() {
                    evidence.resource = Some(text);
                }
            }
            Ok(_) | Err(_) => {
                warn!(service = target.service, "failed to describe resource");
            }
        }
    }

    async fn collect_recent_events(
        &self,
        target: &FallbackTarget<'_>,
        evidence: &mut CollectedEvidence,
    ) {
        if !self.tools.has_tool(EVENTS_TOOL) {
            return;
        }

        let arguments = json!({
            "namespace": target.namespace,
            "resourceType": target.resource_type,
            "name": target.service,
        });
        match self.tools.call_tool(EVENTS_TOOL, arguments).await {
            Ok(result) if !result.is_error => {
                if let Some(text) = result.primary_text() {
                    evidence.events = Some(text);
                }
            }
            Ok(_) | Err(_) => {
                warn!(service = target.service, "failed to fetch events");
            }
        }
    }

    /// Fixed-sentence summary listing which evidence categories were
    /// collected. No free-form generation.
    pub fn build_summary(service: &str, evidence: &CollectedEvidence) -> String {
        let mut parts = vec![format!("Automated diagnostics completed for `{service}`.")];
        parts.push(
            if evidence.logs.is_some() {
                "Log excerpt collected."
            } else {
                "No log excerpt was available."
            }
            .to_string(),
        );
        parts.push(
            if evidence.resource.is_some() {
                "Resource description collected."
            } else {
                "No resource description was available."
            }
            .to_string(),
        );
        parts.push(
            if evidence.events.is_some() {
                "Recent events collected."
            } else {
                "No recent events were available."
            }
            .to_string(),
        );
        parts.join(" ")
    }

    /// Build the notification message posted to the chat channel
    pub fn build_notification(
        service: &str,
        summary: &str,
        issue_url: Option<&str>,
        log_snippet: Option<&str>,
        prompt: &str,
    ) -> String {
        let mut lines = vec![format!("Diagnostics initiated for *{service}*.")];
        if let Some(url) = issue_url {
            lines.push(format!("GitHub issue: {url}"));
        }
        if let Some(snippet) = log_snippet.filter(|s| *s != LOG_SNIPPET_PLACEHOLDER) {
            lines.push(format!("Log snapshot:\n```{snippet}```"));
        }
        lines.push(format!("\nSummary:\n{summary}"));
        lines.push(format!("\nPrompt issued to diagnostics agent:\n```{prompt}```"));
        lines.join("\n")
    }

    /// Post the notification when a channel is configured and the chat
    /// tool exists. Partial failure is logged, not propagated.
    pub async fn post_notification(
        &self,
        channel: &str,
        text: &str,
        evidence: &mut CollectedEvidence,
    ) {
        if channel.is_empty() || !self.tools.has_tool(SLACK_TOOL) {
            return;
        }

        let arguments = json!({"channelId": channel, "text": text});
        match self.tools.call_tool(SLACK_TOOL, arguments).await {
            Ok(result) if !result.is_error => {
                info!(channel, "diagnostics notification posted");
                evidence.slack_result = result
                    .structured_payload()
                    .or_else(|| result.raw_text().map(Value::String));
            }
            Ok(result) => {
                warn!(
                    channel,
                    "chat tool reported an error: {}",
                    result.raw_text().unwrap_or_default()
                );
            }
            Err(e) => {
                warn!(channel, "failed to post notification: {e}");
            }
        }
    }

    /// Create the tracking issue when none exists yet, the repository
    /// coordinates are configured, and the issue tool is available.
    pub async fn create_issue(
        &self,
        target: &FallbackTarget<'_>,
        prompt: &str,
        timestamp: &str,
        log_snippet: Option<&str>,
        evidence: &mut CollectedEvidence,
    ) {
        if evidence.issue.is_some() {
            return;
        }
        let (owner, repo) = match (&self.config.github_owner, &self.config.github_repo) {
            (Some(owner), Some(repo)) => (owner.clone(), repo.clone()),
            _ => return,
        };
        if !self.tools.has_tool(ISSUE_TOOL) {
            return;
        }

        let title = format!("[Diagnostics] {} - {timestamp}", target.service);
        let body = build_issue_body(target, prompt, timestamp, evidence, log_snippet);
        let arguments = json!({
            "owner": owner,
            "repo": repo,
            "title": title,
            "body": body,
            "labels": ["diagnostics", "automated"],
        });

        match self.tools.call_tool(ISSUE_TOOL, arguments).await {
            Ok(result) if !result.is_error => {
                if let Some(issue) = parse_issue(&result) {
                    info!(%owner, %repo, number = issue.number, "diagnostics issue created");
                    evidence.issue = Some(issue);
                }
            }
            Ok(result) => {
                warn!(
                    %owner,
                    %repo,
                    "issue tool reported an error: {}",
                    result.raw_text().unwrap_or_default()
                );
            }
            Err(e) => {
                warn!(%owner, %repo, "failed to create diagnostics issue: {e}");
            }
        }
    }
}

/// Issue body assembled from fixed section templates; a section is only
/// included when its source is non-empty.
fn build_issue_body(
    target: &FallbackTarget<'_>,
    prompt: &str,
    timestamp: &str,
    evidence: &CollectedEvidence,
    log_snippet: Option<&str>,
) -> String {
    let mut sections = vec![format!(
        "## Automated Diagnostics Request\n\
Service: `{}`\n\
Triggered: `{timestamp}`\n\
Namespace: `{}`\n\
Resource type: `{}`",
        target.service, target.namespace, target.resource_type
    )];

    if !prompt.trim().is_empty() {
        sections.push(format!("## Prompt\n```\n{prompt}\n```"));
    }
    if let Some(resource) = evidence.resource.as_deref().filter(|r| !r.trim().is_empty()) {
        sections.push(format!(
            "## Resource Description\nResource: `{}/{}`\n\n```\n{resource}\n```",
            target.resource_type, target.service
        ));
    }
    if let Some(events) = evidence.events.as_deref().filter(|e| !e.trim().is_empty()) {
        sections.push(format!(
            "## Recent Events\nNamespace: `{}`\nResource filter: `{}`\n\n```\n{events}\n```",
            target.namespace, target.service
        ));
    }
    if let Some(snippet) = log_snippet.filter(|s| !s.trim().is_empty() && *s != LOG_SNIPPET_PLACEHOLDER) {
        sections.push(format!(
            "## Log Snapshot\nNamespace: `{}`\nResource: `{}/{}`\n\n```\n{snippet}\n```",
            target.namespace, target.resource_type, target.service
        ));
    }

    sections.join("\n\n")
}

fn last_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
