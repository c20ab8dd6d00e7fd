//! Tool Call Normalization
//!
//! Different chat backend SDKs hand tool calls to the loop in different
//! shapes: a fully-formed function block, a flat name/arguments mapping, or
//! a sparse object with only some fields populated. This module is the one
//! compatibility seam that reconciles them; the loop body never branches on
//! wire shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool call as it arrives from a chat backend, before normalization.
///
/// Deserialization is shape-tolerant: anything that is not a recognizable
/// function block or flat mapping falls into `Sparse` and is probed field
/// by field during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawToolCall {
    /// Function-block wire shape: `{"id", "type", "function": {"name", "arguments"}}`
    Function {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        function: FunctionBlock,
    },
    /// Flat wire shape: `{"id", "name", "arguments"}`
    Flat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    /// Anything else, kept verbatim for transcript replay
    Sparse(Value),
}

/// The nested function block of a function-shaped tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Arguments as a JSON object or as a JSON-encoded string
    #[serde(default)]
    pub arguments: Value,
}

impl RawToolCall {
    /// Build a function-shaped call; handy for tests and scripted backends.
    pub fn function(id: Option<&str>, name: &str, arguments: Value) -> Self {
        Self::Function {
            id: id.map(str::to_string),
            kind: Some("function".to_string()),
            function: FunctionBlock {
                name: Some(name.to_string()),
                arguments,
            },
        }
    }
}

/// Canonical form of a tool call.
///
/// `name` is `None` when the wire shape carried no resolvable tool name;
/// the caller must treat that as "skip this call".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedToolCall {
    pub name: Option<String>,
    pub arguments: Map<String, Value>,
    pub call_id: Option<String>,
}

/// Normalize one raw tool call. Never fails: malformed argument payloads
/// decode to an empty mapping and missing fields become `None`.
pub fn normalize(raw: &RawToolCall) -> NormalizedToolCall {
    match raw {
        RawToolCall::Function { id, function, .. } => NormalizedToolCall {
            name: non_empty(function.name.as_deref()),
            arguments: parse_arguments(&function.arguments),
            call_id: id.clone(),
        },
        RawToolCall::Flat { id, name, arguments } => NormalizedToolCall {
            name: non_empty(Some(name)),
            arguments: parse_arguments(arguments),
            call_id: id.clone(),
        },
        RawToolCall::Sparse(value) => normalize_sparse(value),
    }
}

fn normalize_sparse(value: &Value) -> NormalizedToolCall {
    let function = value.get("function");
    let name = function
        .and_then(|f| f.get("name"))
        .or_else(|| value.get("name"))
        .and_then(Value::as_str);
    let arguments = function
        .and_then(|f| f.get("arguments"))
        .or_else(|| value.get("arguments"))
        .cloned()
        .unwrap_or(Value::Null);
    let call_id = value.get("id").and_then(Value::as_str).map(str::to_string);

    NormalizedToolCall {
        name: non_empty(name),
        arguments: parse_arguments(&arguments),
        call_id,
    }
}

/// Decode a tool call's argument payload into a JSON object, tolerating
/// both object-valued and string-encoded arguments.
pub fn parse_arguments(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn non_empty(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
