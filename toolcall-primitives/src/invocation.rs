//! Agent-issued tool calls.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Random identifier correlating the log lines of one dispatch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for InvocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A request from the agent to run one tool with the supplied arguments.
///
/// Invocations are transient: they are created per tool-call request and
/// consumed by a single dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    id: InvocationId,
    tool_name: String,
    #[serde(default)]
    arguments: Value,
}

impl Invocation {
    /// Creates an invocation with a fresh identifier.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: InvocationId::random(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Creates an invocation from the raw JSON argument string a model emits.
    ///
    /// Blank input is treated as no arguments.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `raw_arguments` is not valid JSON.
    pub fn from_raw(
        tool_name: impl Into<String>,
        raw_arguments: &str,
    ) -> Result<Self, serde_json::Error> {
        let arguments = if raw_arguments.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(raw_arguments)?
        };
        Ok(Self::new(tool_name, arguments))
    }

    /// Returns the invocation identifier.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the requested tool name.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the supplied arguments.
    #[must_use]
    pub fn arguments(&self) -> &Value {
        &self.arguments
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_raw_parses_arguments() {
        let invocation = Invocation::from_raw("shell", r#"{"command":"ls"}"#).expect("json");
        assert_eq!(invocation.tool_name(), "shell");
        assert_eq!(invocation.arguments(), &json!({ "command": "ls" }));
    }

    #[test]
    fn from_raw_treats_blank_as_null() {
        let invocation = Invocation::from_raw("shell", "  ").expect("blank");
        assert!(invocation.arguments().is_null());
    }

    #[test]
    fn from_raw_rejects_malformed_json() {
        assert!(Invocation::from_raw("shell", "{command: ls").is_err());
    }

    #[test]
    fn deserialized_invocation_without_id_gets_one() {
        let first: Invocation =
            serde_json::from_value(json!({ "tool_name": "shell" })).expect("no id");
        let second: Invocation =
            serde_json::from_value(json!({ "tool_name": "shell" })).expect("no id");
        assert!(first.arguments().is_null());
        assert_ne!(first.id(), second.id());
        assert_eq!(first.id().to_string().len(), 36);
    }

    #[test]
    fn each_invocation_gets_its_own_id() {
        let first = Invocation::new("shell", Value::Null);
        let second = Invocation::new("shell", Value::Null);
        assert_ne!(first.id(), second.id());
    }
}
