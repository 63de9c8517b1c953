//! Server implementation
//!
//! The Server owns the tool, resource and prompt registries, answers the
//! built-in methods, and drives the receive loop of a framed transport.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{ Map, Value };
use tokio::io::AsyncRead;
use tokio::sync::RwLock;
use tracing::{ debug, info, warn };

use crate::errors::{ Error, ErrorCode };
use crate::messages::{ ErrorData, Message, RequestId, Response };
use crate::transport::{ StdioTransport, Transport };
use crate::types::{
    CallToolParams,
    CallToolResult,
    GetPromptParams,
    GetPromptResult,
    Implementation,
    InitializeResult,
    ListPromptsResult,
    ListResourcesResult,
    ListToolsResult,
    PROTOCOL_VERSION,
    Prompt,
    PromptMessage,
    ReadResourceParams,
    ReadResourceResult,
    Resource,
    RESOURCE_MIME_TYPE,
    ResourceContents,
    ServerCapabilities,
    Tool,
};

use super::handlers::{
    BuiltinMethod,
    bind_prompt_arguments,
    bind_tool_arguments,
    invoke,
    invoke_method,
    stringify,
};
use super::registry::Registries;

/// Version reported when none is configured
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

/// Identity reported in the `initialize` result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    /// Create server info with the default version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_SERVER_VERSION.to_string(),
        }
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Server for the Model Context Protocol over a framed stream
///
/// Registration and the `initialize` capability snapshot share one lock, so
/// the advertised capabilities always match a complete registry state.
pub struct Server {
    info: ServerInfo,
    protocol_version: String,
    registries: RwLock<Registries>,
}

impl Server {
    /// Create a new server with empty registries
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            protocol_version: PROTOCOL_VERSION.to_string(),
            registries: RwLock::new(Registries::default()),
        }
    }

    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Identity of this server
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Register a tool; a tool with the same name is replaced in place
    pub async fn register_tool<F>(&self, tool: Tool, handler: F)
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        debug!("Registering tool: {}", tool.name);
        self.registries.write().await.insert_tool(tool, Arc::new(handler));
    }

    /// Register a resource; its `uri` may contain `{name}` placeholders
    pub async fn register_resource<F>(&self, resource: Resource, handler: F)
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        debug!("Registering resource: {}", resource.uri);
        self.registries.write().await.insert_resource(resource, Arc::new(handler));
    }

    /// Register a prompt; a prompt with the same name is replaced in place
    pub async fn register_prompt<F>(&self, prompt: Prompt, handler: F)
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        debug!("Registering prompt: {}", prompt.name);
        self.registries.write().await.insert_prompt(prompt, Arc::new(handler));
    }

    /// Register a custom method receiving the raw request params
    ///
    /// Built-in method names are rejected.
    pub async fn register_method<F>(&self, name: impl Into<String>, handler: F) -> Result<(), Error>
        where F: (Fn(Value) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        let name = name.into();
        if BuiltinMethod::from_name(&name).is_some() {
            return Err(Error::Other(format!("Cannot override built-in method: {}", name)));
        }
        debug!("Registering method: {}", name);
        self.registries.write().await.insert_method(name, Arc::new(handler));
        Ok(())
    }

    /// Capabilities as they would be advertised right now
    pub async fn capabilities(&self) -> ServerCapabilities {
        self.registries.read().await.capabilities()
    }

    /// Process one decoded frame, returning the response to send, if any
    pub async fn process_message(&self, frame: Value) -> Option<Value> {
        let response = self.handle_frame(frame).await?;
        match serde_json::to_value(&response) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Classify a frame and route it
    pub async fn handle_frame(&self, frame: Value) -> Option<Response> {
        let method = frame.get("method").and_then(Value::as_str);
        let params = frame
            .get("params")
            .filter(|params| !params.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        match (method, frame.get("id")) {
            (Some(method), Some(id)) =>
                match id.as_i64() {
                    Some(id) => Some(self.handle_request(id, method, params).await),
                    None => Some(invalid_message()),
                }
            (Some(method), None) => {
                self.handle_notification(method, params).await;
                None
            }
            _ => Some(invalid_message()),
        }
    }

    async fn handle_request(&self, id: RequestId, method: &str, params: Value) -> Response {
        debug!("Handling request {}: {}", id, method);
        match self.dispatch(method, params).await {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                debug!("Request {} ({}) failed: {}", id, method, e);
                Response::error(Some(id), e.to_error_data())
            }
        }
    }

    async fn handle_notification(&self, method: &str, params: Value) {
        debug!("Handling notification: {}", method);
        match self.dispatch(method, params).await {
            Ok(_) => {}
            Err(Error::MethodNotFound(_)) => {
                debug!("No handler for notification: {}", method);
            }
            Err(e) => {
                warn!("Error handling notification {}: {}", method, e);
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, Error> {
        if let Some(builtin) = BuiltinMethod::from_name(method) {
            return self.dispatch_builtin(builtin, params).await;
        }

        let handler = self.registries.read().await.method(method).cloned();
        match handler {
            Some(handler) => invoke_method(&handler, params),
            None => Err(Error::MethodNotFound(format!("Method not found: {}", method))),
        }
    }

    async fn dispatch_builtin(&self, method: BuiltinMethod, params: Value) -> Result<Value, Error> {
        match method {
            BuiltinMethod::Initialize => {
                let capabilities = self.registries.read().await.capabilities();
                info!("Initializing with capabilities: {:?}", capabilities);
                to_result(InitializeResult {
                    protocol_version: self.protocol_version.clone(),
                    capabilities,
                    server_info: Implementation::new(&self.info.name, &self.info.version),
                })
            }
            BuiltinMethod::ListTools => {
                let tools = self.registries.read().await.list_tools();
                to_result(ListToolsResult { tools })
            }
            BuiltinMethod::CallTool => {
                let params: CallToolParams = parse_params(params)?;
                let entry = self.registries
                    .read().await
                    .tool(&params.name)
                    .cloned()
                    .ok_or_else(|| Error::MethodNotFound(format!("Tool not found: {}", params.name)))?;
                let args = bind_tool_arguments(&entry.tool, params.arguments)?;
                let value = invoke(&entry.handler, args)?;
                to_result(CallToolResult::text_result(stringify(&value)))
            }
            BuiltinMethod::ListResources => {
                let resources = self.registries.read().await.list_resources();
                to_result(ListResourcesResult { resources })
            }
            BuiltinMethod::ReadResource => {
                let params: ReadResourceParams = parse_params(params)?;
                let matched = self.registries
                    .read().await
                    .match_resource(&params.uri)
                    .map(|(entry, captures)| (entry.handler.clone(), captures));
                let (handler, captures) = matched.ok_or_else(||
                    Error::Other(format!("Resource not found: {}", params.uri))
                )?;
                let value = invoke(&handler, captures.into_iter().map(Value::String).collect())?;
                to_result(ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
                        text: Some(stringify(&value)),
                    }],
                })
            }
            BuiltinMethod::ListPrompts => {
                let prompts = self.registries.read().await.list_prompts();
                to_result(ListPromptsResult { prompts })
            }
            BuiltinMethod::GetPrompt => {
                let params: GetPromptParams = parse_params(params)?;
                let entry = self.registries
                    .read().await
                    .prompt(&params.name)
                    .cloned()
                    .ok_or_else(|| Error::MethodNotFound(format!("Prompt not found: {}", params.name)))?;
                let args = bind_prompt_arguments(&entry.prompt, params.arguments)?;
                let value = invoke(&entry.handler, args)?;
                to_result(GetPromptResult {
                    description: None,
                    messages: vec![PromptMessage::user_text(stringify(&value))],
                })
            }
        }
    }

    /// Answer every frame from the transport until its input ends
    pub async fn serve<R>(&self, transport: StdioTransport<R>) -> Result<(), Error>
        where R: AsyncRead + Unpin
    {
        let (mut reader, writer) = transport.split();
        info!("Server {} {} started", self.info.name, self.info.version);

        while let Some(frame) = reader.next_message().await {
            if let Some(response) = self.handle_frame(frame).await {
                writer.send(&Message::Response(response)).await?;
            }
        }

        info!("Input closed, server {} stopping", self.info.name);
        Ok(())
    }

    /// Serve over this process's stdin and stdout
    pub async fn run_stdio(&self) -> Result<(), Error> {
        self.serve(StdioTransport::stdio()).await
    }
}

fn invalid_message() -> Response {
    Response::error(None, ErrorData::new(ErrorCode::InvalidRequest, "Invalid message format"))
}

fn parse_params<T>(params: Value) -> Result<T, Error> where T: DeserializeOwned {
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn to_result<T>(result: T) -> Result<Value, Error> where T: Serialize {
    Ok(serde_json::to_value(result)?)
}

/// Builder for configuring and creating a Server
pub struct ServerBuilder {
    /// Server name
    server_name: Option<String>,

    /// Server version
    server_version: Option<String>,

    /// Protocol version
    protocol_version: Option<String>,

    /// Entries registered before the server exists
    registries: Registries,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            server_name: None,
            server_version: None,
            protocol_version: None,
            registries: Registries::default(),
        }
    }

    /// Set the server name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Set the server version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    /// Override the protocol version reported by `initialize`
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Add a tool
    pub fn with_tool<F>(mut self, tool: Tool, handler: F) -> Self
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        self.registries.insert_tool(tool, Arc::new(handler));
        self
    }

    /// Add a resource
    pub fn with_resource<F>(mut self, resource: Resource, handler: F) -> Self
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        self.registries.insert_resource(resource, Arc::new(handler));
        self
    }

    /// Add a prompt
    pub fn with_prompt<F>(mut self, prompt: Prompt, handler: F) -> Self
        where F: (Fn(Vec<Value>) -> anyhow::Result<Value>) + Send + Sync + 'static
    {
        self.registries.insert_prompt(prompt, Arc::new(handler));
        self
    }

    /// Build the server
    pub fn build(self) -> Server {
        let info = ServerInfo {
            name: self.server_name.unwrap_or_else(|| "mcp-stdio-server".to_string()),
            version: self.server_version.unwrap_or_else(|| DEFAULT_SERVER_VERSION.to_string()),
        };
        Server {
            info,
            protocol_version: self.protocol_version.unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            registries: RwLock::new(self.registries),
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
