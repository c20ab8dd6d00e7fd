//! Service layer: LLM seam, tool execution boundary, diagnostics workflow

pub mod diagnostics;
pub mod llm;
pub mod tools;
