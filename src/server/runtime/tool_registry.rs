//! Explicit tool registry: the single catalog used by discovery and dispatch.
use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    lib::errors::{RegistryError, ToolError},
    tools::ToolOutput,
};

/// Invocable side of a registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Parameters the handler accepts.
    fn parameters(&self) -> ParameterSchema;

    /// Run the tool with parameters already checked against [`Self::parameters`].
    async fn call(&self, params: Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    /// JSON type name(s) from the schema, e.g. `string`.
    pub kind: Option<String>,
    pub required: bool,
}

/// Declared parameter set of a tool, derived from its JSON schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    /// Schema of a parameter struct deriving `JsonSchema`.
    pub fn of<P: JsonSchema>() -> Self {
        let schema = schemars::schema_for!(P);
        Self::from_json_schema(schema.as_value())
    }

    /// Read `properties` / `required` out of an object schema.
    pub fn from_json_schema(schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let params = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| ParameterSpec {
                        name: name.clone(),
                        kind: describe_type(property),
                        required: required.contains(&name.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { params }
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Reject missing required parameters, undeclared parameters and values of the wrong type.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<(), ToolError> {
        if let Some(missing) = self
            .params
            .iter()
            .find(|param| param.required && !params.contains_key(&param.name))
        {
            return Err(ToolError::MissingParameter {
                name: missing.name.clone(),
            });
        }
        if let Some(unexpected) = params
            .keys()
            .find(|key| !self.params.iter().any(|param| &param.name == *key))
        {
            return Err(ToolError::UnexpectedParameter {
                name: unexpected.clone(),
            });
        }
        for param in &self.params {
            let (Some(kind), Some(value)) = (&param.kind, params.get(&param.name)) else {
                continue;
            };
            if !kind.split('|').any(|kind| value_has_kind(value, kind)) {
                return Err(ToolError::InvalidParameters(format!(
                    "parameter '{}' must be of type {kind}",
                    param.name
                )));
            }
        }
        Ok(())
    }
}

fn value_has_kind(value: &Value, kind: &str) -> bool {
    match kind {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe_type(property: &Value) -> Option<String> {
    match property.get("type")? {
        Value::String(kind) => Some(kind.clone()),
        Value::Array(kinds) => Some(
            kinds
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("|"),
        ),
        _ => None,
    }
}

/// Discovery view of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// A registered tool.
#[derive(Clone)]
pub struct ToolEntry {
    descriptor: ToolDescriptor,
    parameters: ParameterSchema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolEntry {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("descriptor", &self.descriptor)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Name → tool mapping, populated at startup and then shared read-only behind `Arc`.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("registered", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names must be unique and usable as a single URL path segment.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        validate_name(name)?;
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }

        let parameters = handler.parameters();
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(ToolEntry {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
            },
            parameters,
            handler,
        });
        tracing::debug!(
            target: "crontab_explorer::runtime",
            tool = name,
            "Registered tool"
        );
        Ok(())
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).and_then(|idx| self.entries.get(*idx))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty",
        });
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "only ASCII letters, digits, '_' and '-' are allowed",
        });
    }
    Ok(())
}
