//! MCP Initialization Types
//!
//! This module defines the types exchanged by the `initialize` handshake:
//! client and server identity, and the capability advertisement derived from
//! the server's registries.

use serde::{ Deserialize, Serialize };
use serde_json::Value;

/// Protocol version spoken by this crate
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Parameters for the initialize request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InitializeParams {
    /// The version of the MCP protocol, e.g., "2024-11-05"
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Client capabilities; this client advertises none
    #[serde(default)]
    pub capabilities: Value,
    /// Information about the client implementation
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// Result of the initialize request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InitializeResult {
    /// The protocol version the server speaks
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Capabilities derived from the server's registries
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Information about the server implementation
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

/// Information about an implementation (client or server)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    /// Name of the implementation
    pub name: String,
    /// Version of the implementation
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Presence marker for an advertised capability, serialized as `{}`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capability {}

/// Server capabilities
///
/// Each key is present if and only if the matching registry was non-empty
/// when the capabilities were computed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Capability>,
}

impl ServerCapabilities {
    /// Derive capabilities from registry occupancy
    pub fn derive(has_tools: bool, has_resources: bool, has_prompts: bool) -> Self {
        Self {
            tools: has_tools.then_some(Capability {}),
            resources: has_resources.then_some(Capability {}),
            prompts: has_prompts.then_some(Capability {}),
        }
    }

    /// Whether no capability is advertised
    pub fn is_empty(&self) -> bool {
        self.tools.is_none() && self.resources.is_none() && self.prompts.is_none()
    }
}
