//! Tool descriptors and argument schema validation.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result, SchemaError, SchemaIssue};

/// Type tag attached to a tool parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// UTF-8 text.
    String,
    /// Any JSON number.
    Number,
    /// Integral JSON number.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ParameterType {
    /// Returns the lowercase tag used in manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Returns `true` when `value` is acceptable for this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl Display for ParameterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type of the value a tool returns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Plain text consumed verbatim by the agent.
    #[default]
    String,
}

/// Declaration of a single tool parameter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    kind: ParameterType,
    description: String,
    #[serde(default)]
    required: bool,
}

impl ParameterSpec {
    /// Declares a parameter the caller must always supply.
    #[must_use]
    pub fn required(kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: true,
        }
    }

    /// Declares a parameter the caller may omit.
    #[must_use]
    pub fn optional(kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: false,
        }
    }

    /// Declared type tag.
    #[must_use]
    pub const fn kind(&self) -> ParameterType {
        self.kind
    }

    /// Model-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the parameter must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Static schema metadata for one tool.
///
/// Deserialized descriptors pass through the same checks as
/// [`ToolDescriptor::new`] and [`ToolDescriptor::with_input`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorFields")]
pub struct ToolDescriptor {
    name: String,
    description: String,
    #[serde(default)]
    inputs: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    output_type: OutputType,
}

#[derive(Deserialize)]
struct DescriptorFields {
    name: String,
    description: String,
    #[serde(default)]
    inputs: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    output_type: OutputType,
}

impl TryFrom<DescriptorFields> for ToolDescriptor {
    type Error = Error;

    fn try_from(fields: DescriptorFields) -> Result<Self> {
        let mut descriptor =
            Self::new(fields.name, fields.description)?.with_output_type(fields.output_type);
        for (name, spec) in fields.inputs {
            descriptor = descriptor.with_input(name, spec)?;
        }
        Ok(descriptor)
    }
}

impl ToolDescriptor {
    /// Creates a descriptor with no inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the name is blank or contains
    /// whitespace.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: "tool name cannot be empty".into(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidDescriptor {
                reason: format!("tool name `{name}` cannot contain whitespace"),
            });
        }

        Ok(Self {
            name,
            description: description.into(),
            inputs: BTreeMap::new(),
            output_type: OutputType::String,
        })
    }

    /// Declares an input parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the parameter name is blank or
    /// was already declared.
    pub fn with_input(mut self, name: impl Into<String>, spec: ParameterSpec) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: format!("tool `{}` declares a parameter with an empty name", self.name),
            });
        }
        if self.inputs.contains_key(&name) {
            return Err(Error::InvalidDescriptor {
                reason: format!("tool `{}` declares parameter `{name}` twice", self.name),
            });
        }
        self.inputs.insert(name, spec);
        Ok(self)
    }

    /// Sets the output type.
    #[must_use]
    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Returns the unique tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the model-readable summary.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared parameters keyed by name.
    #[must_use]
    pub fn inputs(&self) -> &BTreeMap<String, ParameterSpec> {
        &self.inputs
    }

    /// Returns the declared output type.
    #[must_use]
    pub const fn output_type(&self) -> OutputType {
        self.output_type
    }

    /// Checks `arguments` against the declared inputs.
    ///
    /// `null` is treated as an empty object. Undeclared parameters are
    /// dropped from the returned set.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] listing every missing or mistyped parameter.
    pub fn validate(&self, arguments: &Value) -> std::result::Result<ValidatedArguments, SchemaError> {
        let empty = Map::new();
        let provided = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(SchemaError::new(
                    &self.name,
                    vec![SchemaIssue::NotAnObject {
                        found: json_kind(other),
                    }],
                ));
            }
        };

        let mut issues = Vec::new();
        let mut accepted = Map::new();
        for (name, spec) in &self.inputs {
            match provided.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        issues.push(SchemaIssue::Missing { name: name.clone() });
                    }
                }
                Some(value) if spec.kind.accepts(value) => {
                    accepted.insert(name.clone(), value.clone());
                }
                Some(value) => issues.push(SchemaIssue::WrongType {
                    name: name.clone(),
                    expected: spec.kind,
                    found: json_kind(value),
                }),
            }
        }

        if !issues.is_empty() {
            return Err(SchemaError::new(&self.name, issues));
        }

        for extra in provided.keys().filter(|key| !self.inputs.contains_key(*key)) {
            debug!(tool = %self.name, parameter = %extra, "dropping undeclared argument");
        }

        Ok(ValidatedArguments(accepted))
    }
}

/// Argument set that passed [`ToolDescriptor::validate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatedArguments(Map<String, Value>);

impl ValidatedArguments {
    /// Returns the raw value for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string parameter.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns a non-negative integer parameter.
    #[must_use]
    pub fn u64(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }

    /// Returns a boolean parameter.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    /// Consumes the set, returning the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new("shell", "Run a command")
            .and_then(|d| {
                d.with_input(
                    "command",
                    ParameterSpec::required(ParameterType::String, "Command line"),
                )
            })
            .and_then(|d| {
                d.with_input(
                    "timeout",
                    ParameterSpec::optional(ParameterType::Integer, "Seconds"),
                )
            })
            .expect("descriptor")
    }

    #[test]
    fn validate_accepts_required_and_optional() {
        let args = descriptor()
            .validate(&json!({ "command": "ls", "timeout": 5 }))
            .expect("valid");
        assert_eq!(args.str("command"), Some("ls"));
        assert_eq!(args.u64("timeout"), Some(5));
    }

    #[test]
    fn validate_allows_omitted_optional() {
        let args = descriptor()
            .validate(&json!({ "command": "ls" }))
            .expect("valid");
        assert_eq!(args.u64("timeout"), None);
    }

    #[test]
    fn validate_names_missing_required() {
        let err = descriptor()
            .validate(&json!({ "timeout": 5 }))
            .expect_err("missing command");
        assert_eq!(err.tool(), "shell");
        assert_eq!(
            err.issues(),
            [SchemaIssue::Missing {
                name: "command".into()
            }]
        );
    }

    #[test]
    fn validate_treats_null_as_missing() {
        let err = descriptor()
            .validate(&json!({ "command": null }))
            .expect_err("null command");
        assert_eq!(err.fields().collect::<Vec<_>>(), ["command"]);

        let err = descriptor().validate(&Value::Null).expect_err("no args");
        assert_eq!(err.fields().collect::<Vec<_>>(), ["command"]);
    }

    #[test]
    fn validate_reports_every_type_mismatch() {
        let err = descriptor()
            .validate(&json!({ "command": 42, "timeout": 1.5 }))
            .expect_err("bad types");
        assert_eq!(
            err.issues(),
            [
                SchemaIssue::WrongType {
                    name: "command".into(),
                    expected: ParameterType::String,
                    found: "number",
                },
                SchemaIssue::WrongType {
                    name: "timeout".into(),
                    expected: ParameterType::Integer,
                    found: "number",
                },
            ]
        );
    }

    #[test]
    fn validate_rejects_non_object() {
        let err = descriptor()
            .validate(&json!(["ls"]))
            .expect_err("array payload");
        assert_eq!(err.issues(), [SchemaIssue::NotAnObject { found: "array" }]);
    }

    #[test]
    fn validate_drops_undeclared_arguments() {
        let args = descriptor()
            .validate(&json!({ "command": "ls", "verbose": true }))
            .expect("valid");
        assert!(args.get("verbose").is_none());
        assert_eq!(args.into_inner().len(), 1);
    }

    #[test]
    fn number_accepts_floats_and_integers() {
        assert!(ParameterType::Number.accepts(&json!(1)));
        assert!(ParameterType::Number.accepts(&json!(1.5)));
        assert!(!ParameterType::Integer.accepts(&json!(1.5)));
        assert!(!ParameterType::Boolean.accepts(&json!("true")));
    }

    #[test]
    fn invalid_descriptors_error() {
        let err = ToolDescriptor::new(" ", "blank").expect_err("blank name");
        assert!(matches!(err, Error::InvalidDescriptor { .. }));

        let err = ToolDescriptor::new("two words", "spaced").expect_err("spaced name");
        assert!(matches!(err, Error::InvalidDescriptor { .. }));

        let err = descriptor()
            .with_input(
                "command",
                ParameterSpec::optional(ParameterType::String, "again"),
            )
            .expect_err("duplicate parameter");
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn descriptor_serializes_manifest_shape() {
        let value = serde_json::to_value(descriptor()).expect("serialize");
        assert_eq!(
            value,
            json!({
                "name": "shell",
                "description": "Run a command",
                "inputs": {
                    "command": { "type": "string", "description": "Command line", "required": true },
                    "timeout": { "type": "integer", "description": "Seconds", "required": false }
                },
                "output_type": "string"
            })
        );
    }

    #[test]
    fn deserialize_applies_builder_checks() {
        let parsed: ToolDescriptor = serde_json::from_value(json!({
            "name": "shell",
            "description": "Run a command",
            "inputs": {
                "command": { "type": "string", "description": "Command line", "required": true },
                "timeout": { "type": "integer", "description": "Seconds", "required": false }
            }
        }))
        .expect("valid descriptor");
        assert_eq!(parsed, descriptor());

        let err = serde_json::from_value::<ToolDescriptor>(json!({
            "name": "two words",
            "description": "spaced",
        }))
        .expect_err("whitespace name");
        assert!(err.to_string().contains("cannot contain whitespace"));

        let err = serde_json::from_value::<ToolDescriptor>(json!({
            "name": "shell",
            "description": "Run a command",
            "inputs": { " ": { "type": "string", "description": "blank", "required": false } }
        }))
        .expect_err("blank parameter name");
        assert!(err.to_string().contains("empty name"));
    }
}
