//! Automated service diagnostics driven by MCP-style tools and LLM tool
//! calling.
//!
//! The crate gathers evidence for a misbehaving service (logs, resource
//! description, recent events) through a set of connected tool sessions,
//! optionally drives a bounded tool-calling LLM conversation to decide what
//! to gather and how to act, and produces a human-readable incident
//! artifact: a tracking issue plus a chat notification. When no LLM is
//! configured, or the LLM path yields nothing usable, a deterministic
//! fallback performs the same gather-and-report sequence.
//!
//! Entry point: [`DiagnosticsService::run_diagnostics`]. The tool transport
//! and the completion backend stay behind the [`services::tools::ToolSession`]
//! and [`services::llm::ChatBackend`] traits.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::DiagnosticsConfig;
pub use models::diagnostics::{DiagnosticsRequest, DiagnosticsResult, IssueRef};
pub use models::evidence::{CollectedEvidence, LogPayload};
pub use services::diagnostics::{DiagnosticsService, PayloadLimiter};
pub use services::llm::{ChatBackend, ChatMessage, ChatTurn, RawToolCall, ToolDefinition};
pub use services::tools::{ConnectionManager, ToolBackend, ToolDescriptor, ToolResult, ToolSession};
pub use utils::error::{AppError, AppResult};
