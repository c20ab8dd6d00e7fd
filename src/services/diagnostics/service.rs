//! Diagnostics Service
//!
//! The composition root. Owns configuration defaults, builds the diagnose
//! prompt, drives the connection lifecycle, chooses between the LLM path
//! and the deterministic fallback, and assembles the final result record.
//! Only request-validation failures surface as errors; every other failure
//! mode degrades into a still-valid result with empty fields.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::catalog::ToolCatalogBuilder;
use super::conversation::{ArgumentDefaults, ConversationLoop};
use super::fallback::{FallbackOrchestrator, FallbackTarget, LOG_SNIPPET_LINES};
use super::limiter::PayloadLimiter;
use super::prompts::{diagnose_prompt, PromptParams, SYSTEM_PROMPT};
use crate::config::DiagnosticsConfig;
use crate::models::diagnostics::{DiagnosticsRequest, DiagnosticsResult};
use crate::models::evidence::CollectedEvidence;
use crate::services::llm::provider::ChatBackend;
use crate::services::tools::session::{ConnectionManager, ToolSession};
use crate::utils::error::{AppError, AppResult};

/// Runs the automated diagnostics workflow for a named service
pub struct DiagnosticsService {
    config: DiagnosticsConfig,
    sessions: Vec<Arc<dyn ToolSession>>,
    chat: Option<Arc<dyn ChatBackend>>,
    limiter: PayloadLimiter,
    cancellation: CancellationToken,
}

impl DiagnosticsService {
    /// Create a service over the configured tool sessions, without an LLM
    pub fn new(config: DiagnosticsConfig, sessions: Vec<Arc<dyn ToolSession>>) -> Self {
        Self {
            config,
            sessions,
            chat: None,
            limiter: PayloadLimiter::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach a completion backend; without one the LLM path is skipped
    pub fn with_chat_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.chat = Some(backend);
        self
    }

    /// Override the payload size policy
    pub fn with_limiter(mut self, limiter: PayloadLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Token that aborts the conversation before its next LLM round-trip;
    /// evidence already recorded still reaches the result via the fallback
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run one diagnostics workflow. Fails only for validation errors;
    /// every tool, catalog, or LLM failure degrades into empty fields.
    pub async fn run_diagnostics(&self, request: DiagnosticsRequest) -> AppResult<DiagnosticsResult> {
        request.validate()?;
        let channel = self
            .config
            .resolve_channel(request.slack_channel.as_deref())
            .ok_or_else(|| {
                AppError::validation(
                    "no Slack channel specified for diagnostics; \
                     set DIAGNOSTICS_SLACK_CHANNEL or provide one in the request",
                )
            })?;
        if self.config.github_owner.is_none() || self.config.github_repo.is_none() {
            return Err(AppError::validation(
                "DIAGNOSTICS_GITHUB_OWNER and DIAGNOSTICS_GITHUB_REPO must be set \
                 to create diagnostics issues",
            ));
        }

        let namespace = request
            .namespace
            .clone()
            .unwrap_or_else(|| self.config.default_namespace.clone());
        let resource_type = request
            .resource_type
            .clone()
            .unwrap_or_else(|| self.config.default_resource_type.clone());
        let prompt = diagnose_prompt(&PromptParams {
            service: &request.service,
            namespace: request.namespace.as_deref(),
            project_root: self.config.project_root.as_deref().unwrap_or("<project_root>"),
            repo: self.config.github_repo.as_deref().unwrap_or_default(),
            owner: self.config.github_owner.as_deref().unwrap_or_default(),
            slack_channel: &channel,
        });

        info!(service = request.service.as_str(), "starting diagnostics run");

        // The connection scope is released on every exit path below
        let mut manager = ConnectionManager::new(self.sessions.clone());
        manager.connect().await;
        let result = self
            .run_connected(&manager, &request, &channel, &namespace, &resource_type, &prompt)
            .await;
        manager.shutdown().await;

        Ok(result)
    }

    async fn run_connected(
        &self,
        manager: &ConnectionManager,
        request: &DiagnosticsRequest,
        channel: &str,
        namespace: &str,
        resource_type: &str,
        prompt: &str,
    ) -> DiagnosticsResult {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut evidence = CollectedEvidence::default();
        let mut summary: Option<String> = None;

        if let Some(chat) = &self.chat {
            let catalog = ToolCatalogBuilder::new(&self.config.allowed_tools)
                .build(manager.inventories());
            let defaults = ArgumentDefaults {
                namespace: Some(namespace.to_string()),
                resource_type: Some(resource_type.to_string()),
                tail: Some(self.config.log_tail),
            };
            let conversation = ConversationLoop::new(
                chat.as_ref(),
                manager,
                catalog,
                defaults,
                self.config.max_iterations,
            )
            .with_limiter(self.limiter.clone())
            .with_cancellation(self.cancellation.clone());

            let outcome = conversation.run(SYSTEM_PROMPT, prompt).await;
            info!(
                iterations = outcome.iterations,
                has_summary = outcome.summary.is_some(),
                "conversation loop finished"
            );
            if let Some(error) = outcome.error {
                warn!("LLM path unavailable, falling back: {error}");
            }
            evidence = outcome.evidence;
            summary = outcome.summary.filter(|s| !s.trim().is_empty());
        }

        let fallback = FallbackOrchestrator::new(manager, &self.config);
        let target = FallbackTarget {
            service: &request.service,
            namespace,
            resource_type,
        };

        let mut log_snippet = None;
        if summary.is_none() {
            log_snippet = fallback.gather(&target, &mut evidence).await;
            summary = Some(FallbackOrchestrator::build_summary(&request.service, &evidence));
        }
        if log_snippet.is_none() {
            log_snippet = evidence.log_snippet(LOG_SNIPPET_LINES);
        }
        let summary = summary.unwrap_or_default();

        let notification = FallbackOrchestrator::build_notification(
            &request.service,
            &summary,
            evidence.issue.as_ref().and_then(|i| i.html_url.as_deref()),
            log_snippet.as_deref(),
            prompt,
        );
        fallback
            .post_notification(channel, &notification, &mut evidence)
            .await;
        fallback
            .create_issue(&target, prompt, &timestamp, log_snippet.as_deref(), &mut evidence)
            .await;

        DiagnosticsResult {
            service: request.service.clone(),
            namespace: namespace.to_string(),
            resource_type: resource_type.to_string(),
            prompt: prompt.to_string(),
            timestamp,
            issue_url: evidence.issue.as_ref().and_then(|i| i.html_url.clone()),
            issue_number: evidence.issue.as_ref().and_then(|i| i.number),
            slack_channel: channel.to_string(),
            slack_result: evidence.slack_result.clone(),
            log_snippet,
            resource_description: evidence.resource.clone(),
            events_summary: evidence.events.clone(),
            summary,
        }
    }
}
