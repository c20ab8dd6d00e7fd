//! Diagnostics Request and Result Models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::{AppError, AppResult};

/// A request to run diagnostics for a named service.
///
/// Immutable once a run starts; optional fields fall back to configured
/// defaults when the run begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsRequest {
    /// Name of the service under diagnosis (required, non-empty)
    pub service: String,
    /// Namespace the service runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Resource type backing the service (defaults to "deployment")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Channel that receives the run notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel: Option<String>,
}

impl DiagnosticsRequest {
    /// Create a request for the given service with no overrides
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            namespace: None,
            resource_type: None,
            slack_channel: None,
        }
    }

    /// Set the namespace override
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the resource type override
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Set the notification channel override
    pub fn with_slack_channel(mut self, channel: impl Into<String>) -> Self {
        self.slack_channel = Some(channel.into());
        self
    }

    /// Validate the request before any I/O is attempted
    pub fn validate(&self) -> AppResult<()> {
        if self.service.trim().is_empty() {
            return Err(AppError::validation(
                "service name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reference to a tracking issue created during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    /// Web URL of the issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// Issue number in the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

/// Terminal output of one diagnostics run.
///
/// Produced exactly once per run and never mutated after return. Missing
/// evidence is reported as `None`, not as a failed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsResult {
    pub service: String,
    pub namespace: String,
    pub resource_type: String,
    pub prompt: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<i64>,
    pub slack_channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_summary: Option<String>,
    pub summary: String,
}
