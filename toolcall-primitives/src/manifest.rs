//! Tool listing handed to the agent's prompt-construction step.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::ToolDescriptor;

/// Ordered list of tool descriptors exposed to the agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolManifest {
    tools: Vec<ToolDescriptor>,
}

impl ToolManifest {
    /// Wraps descriptors in the order they should be presented.
    #[must_use]
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    /// Returns the descriptors.
    #[must_use]
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Returns the tool names in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(ToolDescriptor::name)
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Renders the manifest as a JSON array of
    /// `{name, description, inputs, output_type}` entries.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.tools).unwrap_or(Value::Array(Vec::new()))
    }

    /// Renders each tool in the function-calling format accepted by
    /// OpenAI-compatible chat completion APIs.
    #[must_use]
    pub fn to_function_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(function_schema).collect()
    }
}

impl IntoIterator for ToolManifest {
    type Item = ToolDescriptor;
    type IntoIter = std::vec::IntoIter<ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.into_iter()
    }
}

fn function_schema(tool: &ToolDescriptor) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, spec) in tool.inputs() {
        properties.insert(
            name.clone(),
            json!({
                "type": spec.kind().as_str(),
                "description": spec.description(),
            }),
        );
        if spec.is_required() {
            required.push(Value::String(name.clone()));
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": tool.name(),
            "description": tool.description(),
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        },
    })
}
