//! Tool Sessions and the Connection Manager
//!
//! The execution-backend boundary. A `ToolSession` is one connected tool
//! server (the wire transport behind it is out of scope); the
//! `ConnectionManager` owns a per-run set of sessions, snapshots their tool
//! inventories at connect time, routes bare and server-qualified names to
//! the owning session, and releases every session on shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::result::ToolResult;
use crate::utils::error::{AppError, AppResult};

/// A tool as reported by a session's tool listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: Value,
}

/// One connected tool server
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Identifier of the server behind this session, when known
    fn server_name(&self) -> Option<&str>;

    /// List the tools this session exposes
    async fn list_tools(&self) -> AppResult<Vec<ToolDescriptor>>;

    /// Invoke a tool by its bare name
    async fn call_tool(&self, name: &str, arguments: Value) -> AppResult<ToolResult>;

    /// Release the session. Best effort; errors are logged by the manager.
    async fn shutdown(&self) -> AppResult<()> {
        Ok(())
    }
}

/// The execution seam the loop and fallback path call through
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Whether a tool is reachable under the given (bare or qualified) name
    fn has_tool(&self, name: &str) -> bool;

    /// Invoke a tool by bare or qualified name
    async fn call_tool(&self, name: &str, arguments: Value) -> AppResult<ToolResult>;
}

/// Tool inventory snapshot for one session, taken at connect time
#[derive(Debug, Clone)]
pub struct SessionInventory {
    pub server: Option<String>,
    pub tools: Vec<ToolDescriptor>,
}

/// Per-run connection scope over a set of tool sessions.
///
/// `connect` snapshots each session's tools and builds the name routing
/// table; a session whose listing fails is skipped with a warning, not
/// fatal. `shutdown` must run on every exit path of a run.
pub struct ConnectionManager {
    sessions: Vec<Arc<dyn ToolSession>>,
    inventories: Vec<SessionInventory>,
    /// Exposed name (bare or `server.tool`) → (session index, bare name)
    routes: HashMap<String, (usize, String)>,
}

impl ConnectionManager {
    pub fn new(sessions: Vec<Arc<dyn ToolSession>>) -> Self {
        Self {
            sessions,
            inventories: Vec::new(),
            routes: HashMap::new(),
        }
    }

    /// List every session's tools and build the routing table. The first
    /// session to expose a bare name wins; qualified names never collide
    /// across servers.
    pub async fn connect(&mut self) {
        for (index, session) in self.sessions.iter().enumerate() {
            let server = session.server_name().map(str::to_string);
            let tools = match session.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(
                        server = server.as_deref().unwrap_or("<unnamed>"),
                        "skipping session, tool listing failed: {e}"
                    );
                    continue;
                }
            };

            for tool in &tools {
                self.routes
                    .entry(tool.name.clone())
                    .or_insert((index, tool.name.clone()));
                if let Some(server) = server.as_deref() {
                    if server != tool.name {
                        self.routes
                            .entry(format!("{server}.{}", tool.name))
                            .or_insert((index, tool.name.clone()));
                    }
                }
            }

            debug!(
                server = server.as_deref().unwrap_or("<unnamed>"),
                tool_count = tools.len(),
                "session connected"
            );
            self.inventories.push(SessionInventory { server, tools });
        }
    }

    /// Inventories snapshotted at connect time
    pub fn inventories(&self) -> &[SessionInventory] {
        &self.inventories
    }

    /// Release every session, logging failures instead of propagating them
    pub async fn shutdown(&self) {
        for session in &self.sessions {
            if let Err(e) = session.shutdown().await {
                warn!(
                    server = session.server_name().unwrap_or("<unnamed>"),
                    "session shutdown failed: {e}"
                );
            }
        }
    }
}

#[async_trait]
impl ToolBackend for ConnectionManager {
    fn has_tool(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> AppResult<ToolResult> {
        let (index, bare) = self
            .routes
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::tool(format!("unknown tool '{name}'")))?;
        self.sessions[index].call_tool(&bare, arguments).await
    }
}
