//! MCP Client
//!
//! The client correlates framed requests with their responses and exposes
//! typed operations for tools, resources and prompts. Incoming frames are fed
//! to `handle_incoming` by a reader task owned by the caller (see
//! `client::stdio` for the child-process setup).

use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{ Value, json };
use tracing::{ debug, info, warn };

use crate::errors::Error;
use crate::messages::{ Message, Notification };
use crate::transport::Transport;
use crate::types::{
    CallToolResult,
    GetPromptResult,
    Implementation,
    InitializeParams,
    InitializeResult,
    ListPromptsResult,
    ListResourcesResult,
    ListToolsResult,
    PROTOCOL_VERSION,
    Prompt,
    ReadResourceResult,
    Resource,
    ServerCapabilities,
    Tool,
};

use super::request::RequestManager;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Configuration for the MCP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for requests that do not supply their own
    pub request_timeout: Duration,
    /// Identity sent in `initialize`
    pub client_info: Implementation,
    /// Protocol version sent in `initialize`
    pub protocol_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            client_info: Implementation::new("mcp-stdio-client", env!("CARGO_PKG_VERSION")),
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }
}

/// Builder for creating Client instances with custom configuration
pub struct ClientBuilder<T: Transport + 'static> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport + 'static> ClientBuilder<T> {
    /// Create a new client builder with the given transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
        }
    }

    /// Set the default request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the identity sent in `initialize`
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.client_info = Implementation::new(name, version);
        self
    }

    /// Set the protocol version sent in `initialize`
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.config.protocol_version = version.into();
        self
    }

    /// Build the client with the configured options
    pub fn build(self) -> Client<T> {
        Client::new(self.transport, self.config)
    }
}

/// What the server told us during `initialize`
#[derive(Debug, Default)]
struct SessionState {
    initialized: bool,
    server_capabilities: Option<ServerCapabilities>,
    server_info: Option<Implementation>,
}

/// Main client for MCP protocol communication
pub struct Client<T: Transport + 'static> {
    transport: T,
    config: ClientConfig,
    requests: RequestManager,
    /// Set while an `initialize` is in flight or has succeeded
    initialize_sent: AtomicBool,
    session: Mutex<SessionState>,
}

impl<T: Transport + 'static> Client<T> {
    /// Create a new client over the given transport
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            requests: RequestManager::new(config.request_timeout),
            transport,
            config,
            initialize_sent: AtomicBool::new(false),
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Create a new client builder
    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder::new(transport)
    }

    /// The client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform the `initialize` handshake
    ///
    /// Fails with `AlreadyInitialized` if a handshake already succeeded or is
    /// in flight. A failed handshake may be retried.
    pub async fn initialize(&self) -> Result<InitializeResult, Error> {
        if self.initialize_sent.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        let params = InitializeParams {
            protocol_version: self.config.protocol_version.clone(),
            capabilities: json!({}),
            client_info: self.config.client_info.clone(),
        };

        let result = self.request("initialize", Some(serde_json::to_value(params)?)).await;
        let result: InitializeResult = match result.and_then(parse_result) {
            Ok(result) => result,
            Err(e) => {
                self.initialize_sent.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        {
            let mut session = self.session();
            session.initialized = true;
            session.server_capabilities = Some(result.capabilities.clone());
            session.server_info = Some(result.server_info.clone());
        }
        info!(
            "Initialized with server {} {} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );

        Ok(result)
    }

    /// Whether `initialize` has succeeded and `close` has not been called since
    pub fn is_initialized(&self) -> bool {
        self.session().initialized
    }

    /// Capabilities the server advertised, once initialized
    pub fn server_capabilities(&self) -> Option<ServerCapabilities> {
        self.session().server_capabilities.clone()
    }

    /// Identity the server reported, once initialized
    pub fn server_info(&self) -> Option<Implementation> {
        self.session().server_info.clone()
    }

    fn ensure_initialized(&self) -> Result<(), Error> {
        if self.is_initialized() { Ok(()) } else { Err(Error::NotInitialized) }
    }

    /// Send a request with the default timeout and wait for its result
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        self.requests.send_request(&self.transport, method, params, None).await
    }

    /// Send a request with an explicit timeout and wait for its result
    pub async fn request_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration
    ) -> Result<Value, Error> {
        self.requests.send_request(&self.transport, method, params, Some(timeout)).await
    }

    /// Send a notification; no response is expected
    pub async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<(), Error> {
        self.transport.send(&Notification::new(method, params).into()).await
    }

    /// Feed one frame read from the transport
    ///
    /// Responses are delivered to the request waiting on their id; anything
    /// else is logged and dropped.
    pub fn handle_incoming(&self, frame: Value) {
        match Message::from_value(frame) {
            Ok(Message::Response(response)) => {
                self.requests.complete_request(response);
            }
            Ok(Message::Request(request)) => {
                debug!("Ignoring server request {} ({})", request.id, request.method);
            }
            Ok(Message::Notification(notification)) => {
                debug!("Ignoring server notification {}", notification.method);
            }
            Err(e) => {
                warn!("Dropping undecodable frame: {}", e);
            }
        }
    }

    /// Number of requests still waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.requests.pending_count()
    }

    /// List the server's tools
    pub async fn list_tools(&self) -> Result<Vec<Tool>, Error> {
        self.ensure_initialized()?;
        let result: ListToolsResult = parse_result(self.request("tools/list", None).await?)?;
        Ok(result.tools)
    }

    /// Call a tool with named arguments
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, Error> {
        self.ensure_initialized()?;
        let params = json!({ "name": name, "arguments": arguments });
        parse_result(self.request("tools/call", Some(params)).await?)
    }

    /// List the server's resources
    pub async fn list_resources(&self) -> Result<Vec<Resource>, Error> {
        self.ensure_initialized()?;
        let result: ListResourcesResult = parse_result(self.request("resources/list", None).await?)?;
        Ok(result.resources)
    }

    /// Read a resource by concrete URI
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, Error> {
        self.ensure_initialized()?;
        parse_result(self.request("resources/read", Some(json!({ "uri": uri }))).await?)
    }

    /// List the server's prompts
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, Error> {
        self.ensure_initialized()?;
        let result: ListPromptsResult = parse_result(self.request("prompts/list", None).await?)?;
        Ok(result.prompts)
    }

    /// Render a prompt with named arguments
    pub async fn get_prompt(&self, name: &str, arguments: Value) -> Result<GetPromptResult, Error> {
        self.ensure_initialized()?;
        let params = json!({ "name": name, "arguments": arguments });
        parse_result(self.request("prompts/get", Some(params)).await?)
    }

    /// Forget pending requests and the session
    ///
    /// Callers still waiting time out at their deadline. Calling this more
    /// than once is harmless.
    pub fn close(&self) {
        let dropped = self.requests.clear();
        if dropped > 0 {
            debug!("Closed client with {} pending requests", dropped);
        }
        *self.session() = SessionState::default();
        self.initialize_sent.store(false, Ordering::SeqCst);
    }
}

fn parse_result<R>(value: Value) -> Result<R, Error> where R: DeserializeOwned {
    serde_json::from_value(value).map_err(Error::from)
}
