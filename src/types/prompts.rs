//! MCP Prompt Types
//!
//! Named, parameterized text templates and the messages they render to.

use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

use super::Content;

/// Represents a prompt in the MCP protocol
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Unique name of the prompt
    pub name: String,
    /// Description of the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments, in binding order
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

impl Prompt {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare an argument; declaration order is binding order
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// A declared prompt argument
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl PromptArgument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Speaker of a prompt message
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A rendered prompt message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: Content,
}

impl PromptMessage {
    /// A user message carrying text
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::text(text),
        }
    }
}

/// Result of `prompts/list`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListPromptsResult {
    pub prompts: Vec<Prompt>,
}

/// Parameters of `prompts/get`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetPromptParams {
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_empty_map")]
    pub arguments: Map<String, Value>,
}

/// Result of `prompts/get`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// Text of the first message, if it is text content
    pub fn text(&self) -> Option<&str> {
        self.messages.first().and_then(|m| m.content.as_text())
    }
}
