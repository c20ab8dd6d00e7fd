//! Integration Tests Module
//!
//! End-to-end tests for the diagnostics workflow: the tool-calling
//! conversation loop, the deterministic fallback path, and the composed
//! `run_diagnostics` operation.

// Shared scripted chat backend and mock tool sessions
mod support;

// Conversation loop driven through the full service
mod conversation_loop_test;

// Fallback path and result assembly scenarios
mod diagnostics_run_test;
