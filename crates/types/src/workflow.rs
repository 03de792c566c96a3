//! Workflow document schema shared by the engine and the CLI.
//!
//! The structures mirror the YAML authoring format:
//!
//! ```yaml
//! workflow:
//!   name: demo
//!   context: { greeting: hello }
//!   effects:
//!     - name: say_hello
//!       class: Print
//!       config:
//!         value:
//!           context: greeting
//!           default: hi
//! ```
//!
//! Effect declarations and configuration parameters keep authoring order (via `IndexMap`)
//! because declaration order is execution order.

pub mod validation;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use thiserror::Error;

use crate::value::{Value, ValueMap};

/// Name assigned to a workflow that does not declare one.
pub const DEFAULT_WORKFLOW_NAME: &str = "unnamed_workflow";

/// Structural problems detected while reading a workflow document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid workflow document: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("workflow document must contain a 'workflow' key")]
    MissingWorkflow,

    #[error("effect at index {index} must have a 'name'")]
    MissingName { index: usize },

    #[error("effect '{name}' at index {index} must have a 'class'")]
    MissingClass { index: usize, name: String },
}

/// Top-level document: everything lives under the `workflow` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub workflow: Option<WorkflowSection>,
}

/// Body of a workflow document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSection {
    /// Workflow name used in logs and as the compiled pipeline id.
    #[serde(default = "default_workflow_name")]
    pub name: String,
    /// Initial context; arbitrary nesting.
    #[serde(default)]
    pub context: ValueMap,
    /// Ordered effect declarations.
    #[serde(default)]
    pub effects: Vec<EffectDeclaration>,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            name: default_workflow_name(),
            context: ValueMap::new(),
            effects: Vec::new(),
        }
    }
}

/// A single effect entry: binding id, registered class name, and configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EffectDeclaration {
    /// Binding id; becomes the constructed effect's id.
    #[serde(default)]
    pub name: String,
    /// Registered effect type name (plain or qualified).
    #[serde(default)]
    pub class: String,
    /// Configuration parameters keyed by parameter name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, ConfigEntry>,
}

/// Value assigned to a configuration parameter, either a structured binding or a bare literal.
///
/// A bare scalar or sequence is shorthand for a binding with only a `default`. A mapping is
/// always read as a binding; a mapping literal goes under `default:`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigEntry {
    /// Structured binding with an optional context path and default.
    Binding(ConfigBinding),
    /// Literal value used as the default.
    Literal(Value),
}

impl<'de> Deserialize<'de> for ConfigEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Mapping(fields) => ConfigBinding::from_fields(&fields)
                .map(ConfigEntry::Binding)
                .map_err(D::Error::custom),
            other => Ok(ConfigEntry::Literal(other)),
        }
    }
}

impl ConfigEntry {
    /// Normalizes the entry into its structured binding form.
    pub fn into_binding(self) -> ConfigBinding {
        match self {
            ConfigEntry::Binding(binding) => binding,
            ConfigEntry::Literal(value) => ConfigBinding {
                context: None,
                default: Some(value),
                value_type: None,
            },
        }
    }
}

/// Structured configuration binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigBinding {
    /// Dotted path into the context current at the time the effect runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Literal used when the context path is absent or falsy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Optional type the resolved value must satisfy.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl ConfigBinding {
    /// Binding that reads from a context path.
    pub fn from_context(path: impl Into<String>) -> Self {
        Self {
            context: Some(path.into()),
            ..Self::default()
        }
    }

    /// Binding that only carries a literal default.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Builds a binding from the keys of an authored mapping, rejecting unknown keys, a
    /// non-string `context`, and unsupported `type` names.
    pub fn from_fields(fields: &ValueMap) -> Result<Self, String> {
        let mut binding = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "context" => {
                    binding.context = match value {
                        Value::Null => None,
                        Value::String(path) => Some(path.clone()),
                        other => return Err(format!("config binding 'context' must be a string, found {}", other.type_name())),
                    };
                }
                "default" => binding.default = Some(value.clone()),
                "type" => {
                    binding.value_type = match value {
                        Value::Null => None,
                        other => Some(
                            other
                                .as_str()
                                .and_then(ValueType::parse)
                                .ok_or_else(|| format!("unsupported config binding type '{other}'"))?,
                        ),
                    };
                }
                unknown => {
                    return Err(format!(
                        "unknown config binding key '{unknown}' (expected one of: context, default, type)"
                    ));
                }
            }
        }
        Ok(binding)
    }
}

/// Declared parameter types supported by basic validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    #[serde(alias = "double", alias = "float")]
    Number,
    Boolean,
    #[serde(alias = "list")]
    Array,
    #[serde(alias = "map")]
    Object,
}

impl ValueType {
    /// Parses a declared type name, accepting the same aliases as deserialization.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "string" => Some(ValueType::String),
            "integer" => Some(ValueType::Integer),
            "number" | "double" | "float" => Some(ValueType::Number),
            "boolean" => Some(ValueType::Boolean),
            "array" | "list" => Some(ValueType::Array),
            "object" | "map" => Some(ValueType::Object),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl WorkflowDocument {
    /// Parses and structurally validates a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, DocumentError> {
        let document: WorkflowDocument = serde_yaml::from_str(text)?;
        document.validate()?;
        Ok(document)
    }

    /// Renders the document as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Checks the fail-fast rules: a `workflow` section exists and every effect has a
    /// non-empty `name` and `class`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let section = self.workflow.as_ref().ok_or(DocumentError::MissingWorkflow)?;
        for (index, effect) in section.effects.iter().enumerate() {
            if effect.name.trim().is_empty() {
                return Err(DocumentError::MissingName { index });
            }
            if effect.class.trim().is_empty() {
                return Err(DocumentError::MissingClass {
                    index,
                    name: effect.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Consumes the document, returning the validated workflow section.
    pub fn into_section(self) -> Result<WorkflowSection, DocumentError> {
        self.validate()?;
        self.workflow.ok_or(DocumentError::MissingWorkflow)
    }
}

/// Fluent builder for workflow documents.
#[derive(Debug, Clone)]
pub struct WorkflowDocumentBuilder {
    section: WorkflowSection,
}

impl WorkflowDocumentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            section: WorkflowSection {
                name: name.into(),
                ..WorkflowSection::default()
            },
        }
    }

    /// Adds (or replaces) a top-level initial context entry.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.section.context.insert(key.into(), value.into());
        self
    }

    /// Appends an effect declaration.
    pub fn effect<I, K>(mut self, name: impl Into<String>, class: impl Into<String>, config: I) -> Self
    where
        I: IntoIterator<Item = (K, ConfigBinding)>,
        K: Into<String>,
    {
        self.section.effects.push(EffectDeclaration {
            name: name.into(),
            class: class.into(),
            config: config
                .into_iter()
                .map(|(key, binding)| (key.into(), ConfigEntry::Binding(binding)))
                .collect(),
        });
        self
    }

    pub fn build(self) -> WorkflowDocument {
        WorkflowDocument {
            workflow: Some(self.section),
        }
    }

    pub fn to_yaml(self) -> Result<String, serde_yaml::Error> {
        self.build().to_yaml()
    }
}

fn default_workflow_name() -> String {
    DEFAULT_WORKFLOW_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_basic_workflow() {
        let yaml_text = r#"
workflow:
  name: demo
  context:
    greeting: hello
    nested: { count: 2 }
  effects:
    - name: say_hello
      class: Print
      config:
        value:
          context: greeting
          default: hi
    - name: nap
      class: Sleep
      config:
        seconds: 0
"#;

        let document = WorkflowDocument::from_yaml_str(yaml_text).expect("parse workflow");
        let section = document.workflow.expect("workflow section");

        assert_eq!(section.name, "demo");
        assert_eq!(section.context.get("greeting"), Some(&Value::from("hello")));
        assert_eq!(section.effects.len(), 2);
        assert_eq!(section.effects[0].class, "Print");

        let value_binding = section.effects[0].config["value"].clone().into_binding();
        assert_eq!(value_binding.context.as_deref(), Some("greeting"));
        assert_eq!(value_binding.default, Some(Value::from("hi")));

        let seconds = section.effects[1].config["seconds"].clone().into_binding();
        assert_eq!(seconds.context, None);
        assert_eq!(seconds.default, Some(Value::from(0)));
    }

    #[test]
    fn repository_sample_workflow_parses() {
        let yaml_text = include_str!("../../../workflows/demo.yaml");
        let document = WorkflowDocument::from_yaml_str(yaml_text).expect("parse sample workflow");
        let section = document.workflow.expect("workflow section");
        assert_eq!(section.name, "demo");
        assert!(!section.effects.is_empty());
    }

    #[test]
    fn missing_name_defaults_to_unnamed() {
        let document = WorkflowDocument::from_yaml_str("workflow:\n  effects: []\n").expect("parse workflow");
        assert_eq!(document.workflow.expect("section").name, DEFAULT_WORKFLOW_NAME);
    }

    #[test]
    fn rejects_document_without_workflow_key() {
        let error = WorkflowDocument::from_yaml_str("other: 1\n").expect_err("missing workflow key");
        assert!(matches!(error, DocumentError::MissingWorkflow));
    }

    #[test]
    fn rejects_effect_without_name_or_class() {
        let missing_name = "workflow:\n  effects:\n    - class: Print\n";
        let error = WorkflowDocument::from_yaml_str(missing_name).expect_err("missing name");
        assert!(matches!(error, DocumentError::MissingName { index: 0 }));

        let missing_class = "workflow:\n  effects:\n    - name: ok\n      class: Print\n    - name: broken\n";
        let error = WorkflowDocument::from_yaml_str(missing_class).expect_err("missing class");
        assert!(matches!(error, DocumentError::MissingClass { index: 1, ref name } if name == "broken"));
        assert_eq!(error.to_string(), "effect 'broken' at index 1 must have a 'class'");
    }

    #[test]
    fn parses_declared_types_and_aliases() {
        let yaml_text = r#"
workflow:
  effects:
    - name: typed
      class: Sleep
      config:
        seconds: { context: timing.seconds, default: 1, type: integer }
        ratio: { default: 0.5, type: double }
"#;
        let section = WorkflowDocument::from_yaml_str(yaml_text)
            .and_then(WorkflowDocument::into_section)
            .expect("parse workflow");
        let config = &section.effects[0].config;
        assert_eq!(config["seconds"].clone().into_binding().value_type, Some(ValueType::Integer));
        assert_eq!(config["ratio"].clone().into_binding().value_type, Some(ValueType::Number));
    }

    #[test]
    fn builder_output_parses_back() {
        let yaml_text = WorkflowDocumentBuilder::new("built")
            .context("x", 2)
            .effect("double", "Multiply", [("path", ConfigBinding::literal("x")), ("factor", ConfigBinding::literal(2))])
            .effect("check", "AssertEquals", [
                ("actual", ConfigBinding::from_context("x")),
                ("expected", ConfigBinding::literal(4)),
            ])
            .to_yaml()
            .expect("render yaml");

        let section = WorkflowDocument::from_yaml_str(&yaml_text)
            .and_then(WorkflowDocument::into_section)
            .expect("parse rendered yaml");
        assert_eq!(section.name, "built");
        assert_eq!(section.context.get("x"), Some(&Value::from(2)));
        let names = section.effects.iter().map(|effect| effect.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["double", "check"]);
        assert_eq!(
            section.effects[1].config["actual"].clone().into_binding().context.as_deref(),
            Some("x")
        );
    }

    #[test]
    fn misspelled_binding_keys_are_rejected() {
        let yaml_text = "workflow:\n  effects:\n    - name: say\n      class: Print\n      config:\n        value: { contxt: greeting }\n";
        let error = WorkflowDocument::from_yaml_str(yaml_text).expect_err("misspelled key");
        assert!(matches!(error, DocumentError::Syntax(_)));
        assert!(error.to_string().contains("unknown config binding key 'contxt'"), "{error}");
    }

    #[test]
    fn unsupported_binding_types_are_rejected() {
        let yaml_text = "workflow:\n  effects:\n    - name: say\n      class: Print\n      config:\n        value: { context: greeting, type: str }\n";
        let error = WorkflowDocument::from_yaml_str(yaml_text).expect_err("unsupported type");
        assert!(matches!(error, DocumentError::Syntax(_)));
        assert!(error.to_string().contains("unsupported config binding type 'str'"), "{error}");
    }

    #[test]
    fn mapping_literals_go_under_default() {
        let yaml_text = "workflow:\n  effects:\n    - name: put\n      class: Set\n      config:\n        value: { default: { a: 1 } }\n        tags: [x, y]\n";
        let section = WorkflowDocument::from_yaml_str(yaml_text)
            .and_then(WorkflowDocument::into_section)
            .expect("parse workflow");
        let config = &section.effects[0].config;
        let value = config["value"].clone().into_binding();
        assert_eq!(value.context, None);
        assert!(value.default.as_ref().and_then(Value::as_mapping).is_some_and(|map| map.contains_key("a")));
        assert!(matches!(config["tags"], ConfigEntry::Literal(Value::Sequence(_))));
    }

    #[test]
    fn type_names_parse_with_aliases() {
        assert_eq!(ValueType::parse("float"), Some(ValueType::Number));
        assert_eq!(ValueType::parse("list"), Some(ValueType::Array));
        assert_eq!(ValueType::parse("map"), Some(ValueType::Object));
        assert_eq!(ValueType::parse("str"), None);
    }
}
