//! Error Handling
//!
//! Unified error types for the diagnostics engine.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-wide error type.
///
/// `Validation` is the only variant `run_diagnostics` ever surfaces to the
/// caller; every other variant is recovered internally and degrades into
/// placeholder evidence or a fallback path.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation errors (surfaced before any I/O)
    #[error("Validation error: {0}")]
    Validation(String),

    /// LLM completion backend errors
    #[error("LLM backend error: {0}")]
    Llm(String),

    /// Tool invocation errors
    #[error("Tool invocation error: {0}")]
    Tool(String),

    /// Tool catalog/listing errors
    #[error("Tool catalog error: {0}")]
    Catalog(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an LLM backend error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a tool invocation error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is a request validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
