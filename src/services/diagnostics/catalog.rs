//! Tool Catalog Builder
//!
//! Turns the connected sessions' tool inventories into the LLM-consumable
//! catalog. Tools are filtered through the allow-list, and every tool with
//! a known server identifier is registered under both its bare and its
//! `server.tool`-qualified name so a model that emits either spelling
//! still resolves.

use std::collections::HashSet;

use serde_json::Value;

use crate::services::llm::types::{empty_object_schema, ToolDefinition};
use crate::services::tools::session::SessionInventory;

/// The unqualified part of a (possibly `server.tool`-qualified) tool name
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// The `server.tool` spelling, when the server id is known and differs
/// from the bare tool name
pub fn qualified_name(server: Option<&str>, tool: &str) -> Option<String> {
    server
        .filter(|s| !s.is_empty() && *s != tool)
        .map(|s| format!("{s}.{tool}"))
}

/// Builds the deduplicated tool catalog for one run
pub struct ToolCatalogBuilder<'a> {
    allow_list: &'a [String],
}

impl<'a> ToolCatalogBuilder<'a> {
    pub fn new(allow_list: &'a [String]) -> Self {
        Self { allow_list }
    }

    fn is_allowed(&self, bare: &str, qualified: Option<&str>) -> bool {
        self.allow_list.iter().any(|allowed| {
            allowed == bare || qualified.is_some_and(|q| allowed == q)
        })
    }

    /// Build the catalog from the connect-time inventory snapshots
    pub fn build(&self, inventories: &[SessionInventory]) -> Vec<ToolDefinition> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut catalog = Vec::new();

        for inventory in inventories {
            for tool in &inventory.tools {
                let qualified = qualified_name(inventory.server.as_deref(), &tool.name);
                if !self.is_allowed(&tool.name, qualified.as_deref()) {
                    continue;
                }

                let parameters = schema_or_default(&tool.input_schema);
                if seen.insert(tool.name.clone()) {
                    catalog.push(ToolDefinition {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: parameters.clone(),
                    });
                }
                if let Some(qualified) = qualified {
                    if seen.insert(qualified.clone()) {
                        catalog.push(ToolDefinition {
                            name: qualified,
                            description: tool.description.clone(),
                            parameters,
                        });
                    }
                }
            }
        }

        catalog
    }
}

/// A missing or foreign-typed schema defaults to an empty object schema
fn schema_or_default(schema: &Value) -> Value {
    if schema.is_object() {
        schema.clone()
    } else {
        empty_object_schema()
    }
}
