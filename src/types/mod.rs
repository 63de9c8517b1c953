//! MCP Type Definitions
//!
//! This module re-exports the typed entities carried inside requests and
//! responses, organizing them into submodules for initialization, prompts,
//! resources, and tools.

pub mod initialize;
pub mod prompts;
pub mod resources;
pub mod tools;

use serde::{ Deserialize, Deserializer, Serialize };
use serde_json::{ Map, Value };

// Re-export common types from each module
pub use initialize::{
    Capability,
    Implementation,
    InitializeParams,
    InitializeResult,
    PROTOCOL_VERSION,
    ServerCapabilities,
};
pub use prompts::{
    GetPromptParams,
    GetPromptResult,
    ListPromptsResult,
    Prompt,
    PromptArgument,
    PromptMessage,
    Role,
};
pub use resources::{
    ListResourcesResult,
    ReadResourceParams,
    ReadResourceResult,
    Resource,
    ResourceContents,
    RESOURCE_MIME_TYPE,
};
pub use tools::{ CallToolParams, CallToolResult, ListToolsResult, Tool };

/// Deserialize an arguments map, treating `null` like an absent map
pub(crate) fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
    where D: Deserializer<'de>
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A content item inside tool results and prompt messages
///
/// Only `text` content is produced by this crate; other content types are
/// preserved by type name so clients can still inspect them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Content {
    /// Content type, e.g. "text"
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text payload for text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    /// Create a text content item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: Some(text.into()),
        }
    }

    /// The text payload, if this is text content
    pub fn as_text(&self) -> Option<&str> {
        if self.content_type == "text" { self.text.as_deref() } else { None }
    }
}
