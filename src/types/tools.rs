//! MCP Tool Types
//!
//! This module defines types related to tools in the MCP protocol, including
//! `Tool` and `CallToolParams`, which allow the client to invoke named
//! operations on the server.

use schemars::JsonSchema;
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value, json };

use super::Content;

/// Input schema advertised for tools registered without one
pub fn default_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// Represents a tool in the MCP protocol
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tool {
    /// Unique name of the tool
    pub name: String,
    /// Description of what the tool does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema describing the tool's arguments
    #[serde(rename = "inputSchema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a tool with no description and no schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the input schema
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Derive the input schema from a type implementing `JsonSchema`
    ///
    /// Field declaration order of `T` becomes the argument binding order.
    pub fn with_input_type<T: JsonSchema>(self) -> Self {
        let schema = schemars::schema_for!(T);
        match serde_json::to_value(&schema) {
            Ok(schema) => self.with_input_schema(schema),
            Err(e) => {
                tracing::warn!("Failed to serialize schema for tool {}: {}", self.name, e);
                self
            }
        }
    }

    /// Parameter names declared in `inputSchema.properties`, in declaration order
    pub fn parameter_names(&self) -> Vec<String> {
        self.input_schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Parameter names listed in `inputSchema.required`
    pub fn required_parameters(&self) -> Vec<String> {
        self.input_schema
            .as_ref()
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
            .map(|required| {
                required
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy of the tool with the default description and schema filled in
    pub fn with_defaults(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            description: Some(
                self.description.clone().unwrap_or_else(|| format!("Tool: {}", self.name))
            ),
            input_schema: Some(self.input_schema.clone().unwrap_or_else(default_input_schema)),
        }
    }
}

/// Result of `tools/list`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
}

/// Parameters of `tools/call`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CallToolParams {
    /// Name of the tool to call
    pub name: String,
    /// Arguments keyed by parameter name
    #[serde(default, deserialize_with = "super::null_as_empty_map")]
    pub arguments: Map<String, Value>,
}

/// Result of `tools/call`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CallToolResult {
    pub content: Vec<Content>,
}

impl CallToolResult {
    /// Result with a single text item
    pub fn text_result(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
        }
    }

    /// Text of the first content item, if it is text
    pub fn text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }
}
