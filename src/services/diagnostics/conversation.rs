//! Conversation Loop
//!
//! The bounded tool-calling core: repeatedly asks the chat backend for the
//! next turn given the running transcript and tool catalog, executes the
//! requested tool calls in order, and feeds the limited results back. Tool
//! failures become error-shaped results in the transcript, never
//! exceptions; only the iteration budget and an empty turn end the loop.

use serde_json::{Map, Number, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::aggregate::record_tool_result;
use super::catalog::simple_name;
use super::limiter::PayloadLimiter;
use crate::models::evidence::CollectedEvidence;
use crate::services::llm::normalize::normalize;
use crate::services::llm::provider::ChatBackend;
use crate::services::llm::types::{ChatMessage, ToolDefinition};
use crate::services::tools::result::ToolResult;
use crate::services::tools::session::ToolBackend;

/// Defaults injected into tool-call arguments the LLM omitted.
///
/// This is a deliberate default-injection policy, not validation: keys are
/// only added, never overwritten or checked.
#[derive(Debug, Clone, Default)]
pub struct ArgumentDefaults {
    pub namespace: Option<String>,
    pub resource_type: Option<String>,
    pub tail: Option<u64>,
}

impl ArgumentDefaults {
    /// Insert any known default whose key the arguments do not carry
    pub fn apply(&self, arguments: &mut Map<String, Value>) {
        if let Some(namespace) = &self.namespace {
            arguments
                .entry("namespace".to_string())
                .or_insert_with(|| Value::String(namespace.clone()));
        }
        if let Some(resource_type) = &self.resource_type {
            arguments
                .entry("resourceType".to_string())
                .or_insert_with(|| Value::String(resource_type.clone()));
        }
        if let Some(tail) = self.tail {
            arguments
                .entry("tail".to_string())
                .or_insert_with(|| Value::Number(Number::from(tail)));
        }
    }
}

/// Terminal state of one conversation loop run.
///
/// `summary` is None when the budget was exhausted, the run was cancelled,
/// or the backend failed; the caller falls through to the deterministic
/// summary in that case. Evidence collected before the stop is always
/// preserved.
#[derive(Debug)]
pub struct LoopOutcome {
    pub summary: Option<String>,
    pub evidence: CollectedEvidence,
    pub transcript: Vec<ChatMessage>,
    pub iterations: u32,
    pub error: Option<String>,
}

/// The bounded tool-calling conversation
pub struct ConversationLoop<'a> {
    backend: &'a dyn ChatBackend,
    tools: &'a dyn ToolBackend,
    catalog: Vec<ToolDefinition>,
    defaults: ArgumentDefaults,
    limiter: PayloadLimiter,
    max_iterations: u32,
    cancellation: CancellationToken,
}

impl<'a> ConversationLoop<'a> {
    pub fn new(
        backend: &'a dyn ChatBackend,
        tools: &'a dyn ToolBackend,
        catalog: Vec<ToolDefinition>,
        defaults: ArgumentDefaults,
        max_iterations: u32,
    ) -> Self {
        Self {
            backend,
            tools,
            catalog,
            defaults,
            limiter: PayloadLimiter::default(),
            max_iterations,
            cancellation: CancellationToken::new(),
        }
    }

    /// Override the payload size policy
    pub fn with_limiter(mut self, limiter: PayloadLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Attach a caller-supplied cancellation token, checked before each
    /// LLM round-trip
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Run the loop from a fresh two-message transcript
    pub async fn run(&self, system_prompt: &str, user_prompt: &str) -> LoopOutcome {
        let mut transcript = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];
        let mut evidence = CollectedEvidence::default();
        let mut iterations = 0u32;

        loop {
            if self.cancellation.is_cancelled() {
                debug!("conversation cancelled before next round-trip");
                return LoopOutcome {
                    summary: None,
                    evidence,
                    transcript,
                    iterations,
                    error: None,
                };
            }
            if iterations >= self.max_iterations {
                debug!(iterations, "iteration budget exhausted");
                return LoopOutcome {
                    summary: None,
                    evidence,
                    transcript,
                    iterations,
                    error: None,
                };
            }
            iterations += 1;

            let turn = match self
                .backend
                .chat_with_tools(&transcript, &self.catalog)
                .await
            {
                Ok(turn) => turn,
                Err(e) => {
                    warn!("chat backend failed: {e}");
                    return LoopOutcome {
                        summary: None,
                        evidence,
                        transcript,
                        iterations,
                        error: Some(e.to_string()),
                    };
                }
            };

            let text = turn.text();
            let normalized: Vec<_> = turn.tool_calls.iter().map(normalize).collect();
            let runnable = normalized.iter().filter(|call| call.name.is_some()).count();

            // Empty turns are dropped rather than persisted
            if text.is_some() || !turn.tool_calls.is_empty() {
                transcript.push(ChatMessage::Assistant {
                    content: text.clone(),
                    tool_calls: turn.tool_calls.clone(),
                });
            }

            if runnable == 0 {
                return LoopOutcome {
                    summary: text,
                    evidence,
                    transcript,
                    iterations,
                    error: None,
                };
            }

            for call in normalized {
                let Some(name) = call.name else {
                    debug!("skipping tool call with no resolvable name");
                    continue;
                };
                let mut arguments = call.arguments;
                self.defaults.apply(&mut arguments);

                let result = self.invoke(&name, Value::Object(arguments)).await;
                let limited = self.limiter.limit(&result);
                record_tool_result(&mut evidence, &name, &limited);
                transcript.push(ChatMessage::tool_result(
                    call.call_id,
                    simple_name(&name),
                    limited.rendered_text(),
                ));
            }
        }
    }

    /// Invoke one tool, retrying once under the unqualified name when the
    /// qualified spelling fails and the bare tool is recognized. A failure
    /// becomes an error-shaped result, never an error return.
    async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let first = match self.tools.call_tool(name, arguments.clone()).await {
            Ok(result) => return result,
            Err(e) => e,
        };

        let bare = simple_name(name);
        if bare != name && self.tools.has_tool(bare) {
            warn!(tool = name, "tool call failed, retrying as '{bare}': {first}");
            return match self.tools.call_tool(bare, arguments).await {
                Ok(result) => result,
                Err(second) => ToolResult::error(format!("Tool '{bare}' failed: {second}")),
            };
        }

        warn!(tool = name, "tool call failed: {first}");
        ToolResult::error(format!("Tool '{name}' failed: {first}"))
    }
}
