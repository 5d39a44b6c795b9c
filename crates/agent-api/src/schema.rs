use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Self-description of one agent method.
///
/// `arguments` and `returns` are JSON-schema fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSchema {
    pub description: String,
    pub arguments: Value,
    pub returns: Value,
}

impl MethodSchema {
    pub fn new(description: impl Into<String>, arguments: Value, returns: Value) -> Self {
        Self {
            description: description.into(),
            arguments,
            returns,
        }
    }
}

impl Default for MethodSchema {
    fn default() -> Self {
        Self {
            description: String::new(),
            arguments: json!({ "type": "object" }),
            returns: json!({}),
        }
    }
}

/// Method name to schema.
pub type AgentSchema = BTreeMap<String, MethodSchema>;
