//! Shared test doubles: a scripted chat backend and a mock tool session.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use diagnostics_agent::services::llm::normalize::RawToolCall;
use diagnostics_agent::services::llm::types::{ChatMessage, ChatTurn, ToolDefinition};
use diagnostics_agent::{
    AppError, AppResult, ChatBackend, DiagnosticsConfig, ToolDescriptor, ToolResult, ToolSession,
};

/// A configured baseline: diagnostics channel plus issue coordinates
pub fn configured() -> DiagnosticsConfig {
    let mut config = DiagnosticsConfig::default();
    config.slack_diagnostics_channel = Some("C-diag".to_string());
    config.github_owner = Some("acme".to_string());
    config.github_repo = Some("shop".to_string());
    config
}

/// Chat backend that replays scripted turns in order. When the script is
/// exhausted it keeps requesting a `get_logs` tool call, which is how a
/// model that never stops calling tools looks to the loop.
pub struct ScriptedChat {
    turns: Mutex<Vec<ChatTurn>>,
    round_trips: AtomicU32,
    seen_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedChat {
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self {
            turns: Mutex::new(turns),
            round_trips: AtomicU32::new(0),
            seen_tools: Mutex::new(Vec::new()),
        }
    }

    /// A backend that requests tool calls on every turn, forever
    pub fn always_tool_calls() -> Self {
        Self::new(Vec::new())
    }

    pub fn round_trips(&self) -> u32 {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Tool names offered on each round-trip, in order
    pub fn seen_tools(&self) -> Vec<Vec<String>> {
        self.seen_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> AppResult<ChatTurn> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.seen_tools
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.name.clone()).collect());

        let mut turns = self.turns.lock().unwrap();
        if turns.is_empty() {
            return Ok(ChatTurn::with_tool_calls(
                None,
                vec![RawToolCall::function(Some("call_more"), "get_logs", json!({}))],
            ));
        }
        Ok(turns.remove(0))
    }
}

/// One mock tool server. Tools answer with canned results, fail on demand,
/// and every call and shutdown is recorded.
pub struct MockSession {
    server: Option<String>,
    tool_names: Vec<String>,
    responses: HashMap<String, ToolResult>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, Value)>>,
    shutdowns: AtomicU32,
}

impl MockSession {
    pub fn new(server: Option<&str>, tool_names: &[&str]) -> Self {
        Self {
            server: server.map(str::to_string),
            tool_names: tool_names.iter().map(|n| n.to_string()).collect(),
            responses: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            shutdowns: AtomicU32::new(0),
        }
    }

    pub fn with_response(mut self, name: &str, result: ToolResult) -> Self {
        self.responses.insert(name.to_string(), result);
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }

    pub fn call_arguments(&self, name: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn shutdown_count(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSession for MockSession {
    fn server_name(&self) -> Option<&str> {
        self.server.as_deref()
    }

    async fn list_tools(&self) -> AppResult<Vec<ToolDescriptor>> {
        Ok(self
            .tool_names
            .iter()
            .map(|name| ToolDescriptor {
                name: name.clone(),
                description: format!("{name} tool"),
                input_schema: json!({"type": "object", "properties": {}}),
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> AppResult<ToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        if self.failing.contains(name) {
            return Err(AppError::tool(format!("{name} is down")));
        }
        Ok(self
            .responses
            .get(name)
            .cloned()
            .unwrap_or_else(|| ToolResult::text(format!("{name} output"))))
    }

    async fn shutdown(&self) -> AppResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A session preloaded with the conventional diagnostics tools
pub fn full_session() -> Arc<MockSession> {
    Arc::new(
        MockSession::new(Some("ops"), &[
            "get_logs",
            "describe_deployment",
            "get_events",
            "create_issue",
            "slack_post_message",
        ])
        .with_response("get_logs", ToolResult::text("line 1\nline 2\nline 3"))
        .with_response("describe_deployment", ToolResult::text("Replicas: 3"))
        .with_response("get_events", ToolResult::text("BackOff pulling image"))
        .with_response(
            "create_issue",
            ToolResult::text(
                json!({"html_url": "https://github.com/acme/shop/issues/7", "number": 7})
                    .to_string(),
            ),
        )
        .with_response(
            "slack_post_message",
            ToolResult::data(json!({"ok": true, "ts": "123.456"})),
        ),
    )
}
