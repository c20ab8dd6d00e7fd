//! Fallback-path and result-assembly scenarios.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use diagnostics_agent::services::diagnostics::fallback::LOG_SNIPPET_PLACEHOLDER;
use diagnostics_agent::services::llm::types::{ChatMessage, ChatTurn, ToolDefinition};
use diagnostics_agent::{
    AppError, AppResult, ChatBackend, DiagnosticsRequest, DiagnosticsService, ToolResult,
};

use super::support::{configured, full_session, MockSession};

#[tokio::test]
async fn checkout_api_without_llm_or_issue_tool() {
    // Log and chat tools available, issue tool unavailable, no LLM
    let session = Arc::new(
        MockSession::new(Some("ops"), &["get_logs", "slack_post_message"])
            .with_response("get_logs", ToolResult::text("line 1\nline 2"))
            .with_response("slack_post_message", ToolResult::data(json!({"ok": true}))),
    );
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);

    let result = service
        .run_diagnostics(DiagnosticsRequest::new("checkout-api"))
        .await
        .unwrap();

    assert_eq!(result.log_snippet.as_deref(), Some("line 1\nline 2"));
    assert!(result.issue_url.is_none());
    assert!(result.slack_result.is_some());
    assert!(result.summary.contains("Log excerpt collected."));
    assert_eq!(session.call_count("create_issue"), 0);
}

#[tokio::test]
async fn failing_log_tool_yields_placeholder_snippet() {
    let session = Arc::new(
        MockSession::new(Some("ops"), &["get_logs", "get_events", "slack_post_message"])
            .with_failing("get_logs")
            .with_response("get_events", ToolResult::text("BackOff"))
            .with_response("slack_post_message", ToolResult::data(json!({"ok": true}))),
    );
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);

    let result = service
        .run_diagnostics(DiagnosticsRequest::new("checkout-api"))
        .await
        .unwrap();

    assert_eq!(result.log_snippet.as_deref(), Some(LOG_SNIPPET_PLACEHOLDER));
    // Other evidence collection is not blocked by the log failure
    assert_eq!(result.events_summary.as_deref(), Some("BackOff"));
    assert!(result.slack_result.is_some());
}

#[tokio::test]
async fn full_fallback_gathers_reports_and_files_issue() {
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);

    let result = service
        .run_diagnostics(
            DiagnosticsRequest::new("checkout-api").with_namespace("prod"),
        )
        .await
        .unwrap();

    assert_eq!(result.namespace, "prod");
    assert_eq!(result.resource_description.as_deref(), Some("Replicas: 3"));
    assert_eq!(result.events_summary.as_deref(), Some("BackOff pulling image"));
    assert_eq!(result.issue_number, Some(7));
    assert_eq!(
        result.issue_url.as_deref(),
        Some("https://github.com/acme/shop/issues/7")
    );
    assert_eq!(session.call_count("create_issue"), 1);
    assert_eq!(session.call_count("slack_post_message"), 1);

    // The fallback passes the configured defaults to the log tool
    let log_args = session.call_arguments("get_logs");
    assert_eq!(log_args.len(), 1);
    assert_eq!(log_args[0]["namespace"], "prod");
    assert_eq!(log_args[0]["resourceType"], "deployment");
    assert_eq!(log_args[0]["tail"], 1000);
}

#[tokio::test]
async fn validation_failure_precedes_any_tool_call() {
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);

    let err = service
        .run_diagnostics(DiagnosticsRequest::new("   "))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(session.call_count("get_logs"), 0);
    assert_eq!(session.call_count("slack_post_message"), 0);
    assert_eq!(session.shutdown_count(), 0);
}

struct FailingChat;

#[async_trait]
impl ChatBackend for FailingChat {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> AppResult<ChatTurn> {
        Err(AppError::llm("completion backend unreachable"))
    }
}

#[tokio::test]
async fn llm_failure_degrades_to_fallback_not_error() {
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()])
        .with_chat_backend(Arc::new(FailingChat));

    let result = service
        .run_diagnostics(DiagnosticsRequest::new("checkout-api"))
        .await
        .unwrap();

    assert!(result.summary.contains("Log excerpt collected."));
    assert!(result.slack_result.is_some());
    assert_eq!(result.issue_number, Some(7));
}

#[tokio::test]
async fn sessions_are_released_on_every_exit_path() {
    // Success path
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);
    service
        .run_diagnostics(DiagnosticsRequest::new("checkout-api"))
        .await
        .unwrap();
    assert_eq!(session.shutdown_count(), 1);

    // LLM failure path
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()])
        .with_chat_backend(Arc::new(FailingChat));
    service
        .run_diagnostics(DiagnosticsRequest::new("checkout-api"))
        .await
        .unwrap();
    assert_eq!(session.shutdown_count(), 1);
}

#[tokio::test]
async fn request_channel_overrides_configured_channel() {
    let session = full_session();
    let service = DiagnosticsService::new(configured(), vec![session.clone()]);

    let result = service
        .run_diagnostics(
            DiagnosticsRequest::new("checkout-api").with_slack_channel("C-override"),
        )
        .await
        .unwrap();

    assert_eq!(result.slack_channel, "C-override");
    let slack_args = session.call_arguments("slack_post_message");
    assert_eq!(slack_args[0]["channelId"], "C-override");
}
