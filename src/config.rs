//! Diagnostics Configuration
//!
//! Run-level defaults for the diagnostics workflow. Values come from the
//! process environment (`DIAGNOSTICS_*` variables) or from serde defaults
//! when deserialized from a config file.

use serde::{Deserialize, Serialize};

/// Configuration for the diagnostics service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Channel used for diagnostics notifications (takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_diagnostics_channel: Option<String>,
    /// General-purpose channel used when no diagnostics channel is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_slack_channel: Option<String>,
    /// Owner of the repository that receives tracking issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_owner: Option<String>,
    /// Repository that receives tracking issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    /// Namespace used when the request does not name one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Resource type used when the request does not name one
    #[serde(default = "default_resource_type")]
    pub default_resource_type: String,
    /// Number of log lines requested from the log tool
    #[serde(default = "default_log_tail")]
    pub log_tail: u64,
    /// Project root referenced by the diagnose prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
    /// Maximum number of LLM round-trips per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Tools the LLM may see and call (bare or server-qualified names)
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_resource_type() -> String {
    "deployment".to_string()
}

fn default_log_tail() -> u64 {
    1000
}

fn default_max_iterations() -> u32 {
    6
}

fn default_allowed_tools() -> Vec<String> {
    [
        "get_logs",
        "describe_deployment",
        "describe_pod",
        "describe_service",
        "get_events",
        "create_issue",
        "slack_post_message",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            slack_diagnostics_channel: None,
            default_slack_channel: None,
            github_owner: None,
            github_repo: None,
            default_namespace: default_namespace(),
            default_resource_type: default_resource_type(),
            log_tail: default_log_tail(),
            project_root: None,
            max_iterations: default_max_iterations(),
            allowed_tools: default_allowed_tools(),
        }
    }
}

impl DiagnosticsConfig {
    /// Build a configuration from `DIAGNOSTICS_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.slack_diagnostics_channel = env_string("DIAGNOSTICS_SLACK_CHANNEL");
        config.default_slack_channel = env_string("DEFAULT_SLACK_CHANNEL");
        config.github_owner = env_string("DIAGNOSTICS_GITHUB_OWNER");
        config.github_repo = env_string("DIAGNOSTICS_GITHUB_REPO");
        config.project_root = env_string("DIAGNOSTICS_PROJECT_ROOT");

        if let Some(ns) = env_string("DIAGNOSTICS_DEFAULT_NAMESPACE") {
            config.default_namespace = ns;
        }
        if let Some(rt) = env_string("DIAGNOSTICS_RESOURCE_TYPE") {
            config.default_resource_type = rt;
        }
        if let Some(tail) = env_string("DIAGNOSTICS_LOG_TAIL").and_then(|v| v.parse().ok()) {
            config.log_tail = tail;
        }
        if let Some(max) = env_string("DIAGNOSTICS_MAX_ITERATIONS").and_then(|v| v.parse().ok()) {
            config.max_iterations = max;
        }
        if let Some(tools) = env_string("DIAGNOSTICS_ALLOWED_TOOLS") {
            let parsed: Vec<String> = tools
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.allowed_tools = parsed;
            }
        }

        config
    }

    /// Resolve the notification channel for a run: the request channel wins,
    /// then the diagnostics channel, then the general default.
    pub fn resolve_channel(&self, request_channel: Option<&str>) -> Option<String> {
        request_channel
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| self.slack_diagnostics_channel.clone())
            .or_else(|| self.default_slack_channel.clone())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
