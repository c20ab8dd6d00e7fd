//! LLM conversation types, tool-call normalization, and the chat backend seam

pub mod normalize;
pub mod provider;
pub mod types;

pub use normalize::{normalize, NormalizedToolCall, RawToolCall};
pub use provider::ChatBackend;
pub use types::{ChatMessage, ChatTurn, ToolDefinition};
