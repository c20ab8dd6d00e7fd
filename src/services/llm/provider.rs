//! Chat Backend Trait
//!
//! The single seam to the LLM completion backend. The backend is optional:
//! when absent the service skips the conversation loop entirely and runs
//! the deterministic fallback path.

use async_trait::async_trait;

use super::types::{ChatMessage, ChatTurn, ToolDefinition};
use crate::utils::error::AppResult;

/// A completion backend that supports tool calling.
///
/// One operation: given the transcript so far and the tool catalog, return
/// the model's next turn. No retries are performed by the caller; a single
/// failure means "LLM path unavailable" and triggers fallback.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> AppResult<ChatTurn>;
}
