//! MCP Resource Types
//!
//! This module defines types related to resources in the MCP protocol:
//! URI-addressed readable values, possibly templated with `{name}`
//! placeholders on the server side.

use serde::{ Deserialize, Serialize };

/// MIME type reported for every resource read
pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// Represents a resource in the MCP protocol
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resource {
    /// URI or URI pattern of the resource
    pub uri: String,
    /// Human-readable name for the resource
    pub name: String,
    /// Optional description of the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource content (e.g., "text/plain")
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Resource {
    /// Create a resource whose name is its URI
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            name: uri.clone(),
            uri,
            description: None,
            mime_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Result of `resources/list`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListResourcesResult {
    pub resources: Vec<Resource>,
}

/// Parameters of `resources/read`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadResourceParams {
    /// Concrete URI to read
    pub uri: String,
}

/// One content item of a resource read
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceContents {
    /// The URI that was read
    pub uri: String,
    /// MIME type of the text
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Result of `resources/read`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

impl ReadResourceResult {
    /// Text of the first content item
    pub fn text(&self) -> Option<&str> {
        self.contents.first().and_then(|c| c.text.as_deref())
    }

    /// MIME type of the first content item
    pub fn mime_type(&self) -> Option<&str> {
        self.contents.first().and_then(|c| c.mime_type.as_deref())
    }
}
