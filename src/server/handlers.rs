//! Handler plumbing for the dispatcher
//!
//! Built-in method names, argument binding for tools and prompts, and the
//! conversion of handler results and failures into protocol values.

use std::any::Any;
use std::fmt;
use std::panic::{ self, AssertUnwindSafe };
use std::sync::Arc;

use serde_json::{ Map, Value };

use crate::errors::Error;
use crate::types::{ Prompt, Tool };

/// Handler for tools, resources and prompts; receives the bound values in order
pub type Handler = Arc<dyn (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync>;

/// Handler for custom methods; receives the request `params` (`{}` when absent)
pub type MethodHandler = Arc<dyn (Fn(Value) -> anyhow::Result<Value>) + Send + Sync>;

/// The closed set of methods every server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMethod {
    Initialize,
    ListTools,
    CallTool,
    ListResources,
    ReadResource,
    ListPrompts,
    GetPrompt,
}

impl BuiltinMethod {
    pub const ALL: [BuiltinMethod; 7] = [
        BuiltinMethod::Initialize,
        BuiltinMethod::ListTools,
        BuiltinMethod::CallTool,
        BuiltinMethod::ListResources,
        BuiltinMethod::ReadResource,
        BuiltinMethod::ListPrompts,
        BuiltinMethod::GetPrompt,
    ];

    /// Wire name of the method
    pub fn name(self) -> &'static str {
        match self {
            BuiltinMethod::Initialize => "initialize",
            BuiltinMethod::ListTools => "tools/list",
            BuiltinMethod::CallTool => "tools/call",
            BuiltinMethod::ListResources => "resources/list",
            BuiltinMethod::ReadResource => "resources/read",
            BuiltinMethod::ListPrompts => "prompts/list",
            BuiltinMethod::GetPrompt => "prompts/get",
        }
    }

    /// Look up a built-in method by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }
}

impl fmt::Display for BuiltinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Visible text of a handler result
///
/// Strings are used as-is; every other value is rendered as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Bind `tools/call` arguments to the tool's declared parameters
pub fn bind_tool_arguments(tool: &Tool, mut arguments: Map<String, Value>) -> Result<Vec<Value>, Error> {
    let names = tool.parameter_names();
    if names.is_empty() {
        return Ok(arguments.into_iter().map(|(_, value)| value).collect());
    }

    let required = tool.required_parameters();
    names
        .iter()
        .map(|name| {
            match arguments.remove(name) {
                Some(value) => Ok(value),
                None if required.contains(name) => {
                    Err(Error::InvalidParams(format!("Missing required argument: {}", name)))
                }
                None => Ok(Value::Null),
            }
        })
        .collect()
}

/// Bind `prompts/get` arguments to the prompt's declared arguments
pub fn bind_prompt_arguments(
    prompt: &Prompt,
    mut arguments: Map<String, Value>
) -> Result<Vec<Value>, Error> {
    if prompt.arguments.is_empty() {
        return Ok(arguments.into_iter().map(|(_, value)| value).collect());
    }

    prompt.arguments
        .iter()
        .map(|declared| {
            match arguments.remove(&declared.name) {
                Some(value) => Ok(value),
                None if declared.required => {
                    Err(Error::InvalidParams(format!("Missing required argument: {}", declared.name)))
                }
                None => Ok(Value::Null),
            }
        })
        .collect()
}

/// Run a handler, turning errors and panics into `Error::Handler`
pub fn invoke(handler: &Handler, args: Vec<Value>) -> Result<Value, Error> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Error::Handler(e.to_string())),
        Err(payload) => Err(Error::Handler(panic_message(payload.as_ref()))),
    }
}

/// Run a custom method handler with the same failure conversion as `invoke`
pub fn invoke_method(handler: &MethodHandler, params: Value) -> Result<Value, Error> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(params))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Error::Handler(e.to_string())),
        Err(payload) => Err(Error::Handler(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    }
}
