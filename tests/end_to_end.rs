//! End-to-end tests: a client and a server connected by in-memory pipes

use std::sync::Arc;
use std::time::Duration;

use serde_json::{ Value, json };
use tokio::task::JoinHandle;

use mcp_stdio::client::spawn_reader;
use mcp_stdio::types::{ Prompt, PromptArgument, Resource, Tool };
use mcp_stdio::{
    Client,
    ClientConfig,
    Error,
    ErrorCode,
    FrameWriter,
    Server,
    ServerInfo,
    StdioTransport,
    Transport,
};

struct Connection {
    client: Arc<Client<FrameWriter>>,
    server_task: JoinHandle<Result<(), Error>>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    async fn shutdown(self) {
        self.client.close();
        self.client.transport().close().await.unwrap();
        self.server_task.await.unwrap().unwrap();
        self.reader_task.await.unwrap();
    }
}

fn connect(server: Server, config: ClientConfig) -> Connection {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client_io);

    let server_task = tokio::spawn(async move {
        server.serve(StdioTransport::new(server_read, server_write)).await
    });

    let (reader, writer) = StdioTransport::new(client_read, client_write).split();
    let client = Arc::new(Client::new(writer, config));
    let reader_task = spawn_reader(reader, client.clone());

    Connection { client, server_task, reader_task }
}

async fn test_server() -> Server {
    let server = Server::new(ServerInfo::new("test-server").with_version("1.0.0"));

    server.register_tool(
        Tool::new("add")
            .with_description("Add two numbers")
            .with_input_schema(
                json!({
                "type": "object",
                "properties": { "a": { "type": "number" }, "b": { "type": "number" } },
                "required": ["a", "b"]
            })
            ),
        |args| {
            let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!(sum))
        }
    ).await;

    server.register_tool(Tool::new("divide"), |args| {
        let a = args.first().and_then(Value::as_f64).unwrap_or_default();
        let b = args.get(1).and_then(Value::as_f64).unwrap_or_default();
        if b == 0.0 {
            anyhow::bail!("Division by zero");
        }
        Ok(json!(a / b))
    }).await;

    server.register_resource(Resource::new("test://static"), |_| Ok(json!("Static content"))).await;
    server.register_resource(Resource::new("test://{id}"), |args| {
        Ok(json!(format!("Dynamic content for {}", args[0].as_str().unwrap_or_default())))
    }).await;

    server.register_prompt(
        Prompt::new("greeting")
            .with_description("Greet someone")
            .with_argument(PromptArgument::new("name").required(true)),
        |args| Ok(json!(format!("Hello, {}!", args[0].as_str().unwrap_or_default())))
    ).await;

    server
}

#[tokio::test]
async fn test_full_session() {
    let connection = connect(test_server().await, ClientConfig::default());
    let client = connection.client.clone();

    let init = client.initialize().await.unwrap();
    insta::assert_json_snapshot!(init, @r#"
    {
      "protocolVersion": "2024-11-05",
      "capabilities": {
        "tools": {},
        "resources": {},
        "prompts": {}
      },
      "serverInfo": {
        "name": "test-server",
        "version": "1.0.0"
      }
    }
    "#);

    let tools = client.list_tools().await.unwrap();
    insta::assert_json_snapshot!(tools, @r#"
    [
      {
        "name": "add",
        "description": "Add two numbers",
        "inputSchema": {
          "type": "object",
          "properties": {
            "a": {
              "type": "number"
            },
            "b": {
              "type": "number"
            }
          },
          "required": [
            "a",
            "b"
          ]
        }
      },
      {
        "name": "divide",
        "description": "Tool: divide",
        "inputSchema": {
          "type": "object",
          "properties": {},
          "required": []
        }
      }
    ]
    "#);

    let result = client.call_tool("add", json!({ "a": 5, "b": 3 })).await.unwrap();
    assert_eq!(result.text(), Some("8"));

    let resource = client.read_resource("test://static").await.unwrap();
    assert_eq!(resource.text(), Some("Static content"));
    assert_eq!(resource.mime_type(), Some("application/json"));

    let resource = client.read_resource("test://123").await.unwrap();
    assert_eq!(resource.text(), Some("Dynamic content for 123"));

    let resources = client.list_resources().await.unwrap();
    let uris: Vec<&str> = resources
        .iter()
        .map(|resource| resource.uri.as_str())
        .collect();
    assert_eq!(uris, vec!["test://static", "test://{id}"]);

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts[0].name, "greeting");
    assert_eq!(prompts[0].description.as_deref(), Some("Greet someone"));
    assert!(prompts[0].arguments[0].required);

    let prompt = client.get_prompt("greeting", json!({ "name": "World" })).await.unwrap();
    assert_eq!(prompt.text(), Some("Hello, World!"));

    connection.shutdown().await;
}

#[tokio::test]
async fn test_errors_do_not_break_the_session() {
    let connection = connect(test_server().await, ClientConfig::default());
    let client = connection.client.clone();
    client.initialize().await.unwrap();

    match client.call_tool("divide", json!({ "a": 1, "b": 0 })).await {
        Err(Error::Protocol(data)) => {
            assert_eq!(data.error_code(), Some(ErrorCode::InternalError));
            assert!(data.message.contains("Division by zero"));
        }
        other => panic!("expected protocol error, got {:?}", other),
    }

    match client.call_tool("missing", json!({})).await {
        Err(Error::Protocol(data)) => assert_eq!(data.error_code(), Some(ErrorCode::MethodNotFound)),
        other => panic!("expected protocol error, got {:?}", other),
    }

    match client.read_resource("x://y").await {
        Err(Error::Protocol(data)) => {
            assert_eq!(data.error_code(), Some(ErrorCode::InternalError));
            assert_eq!(data.message, "Resource not found: x://y");
        }
        other => panic!("expected protocol error, got {:?}", other),
    }

    match client.request("unknown/method", None).await {
        Err(err) => assert!(err.to_string().contains("Method not found")),
        Ok(value) => panic!("expected an error, got {}", value),
    }

    let result = client.call_tool("divide", json!({ "a": 9, "b": 3 })).await.unwrap();
    assert_eq!(result.text(), Some("3.0"));

    connection.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_calls_over_one_connection() {
    let connection = connect(test_server().await, ClientConfig::default());
    let client = connection.client.clone();
    client.initialize().await.unwrap();

    let mut calls = Vec::new();
    for i in 0..20i64 {
        let client = client.clone();
        calls.push(
            tokio::spawn(async move {
                let result = client.call_tool("add", json!({ "a": i, "b": 100 })).await?;
                Ok::<_, Error>((i, result.text().map(str::to_string)))
            })
        );
    }

    for call in calls {
        let (i, text) = call.await.unwrap().unwrap();
        assert_eq!(text, Some((i + 100).to_string()));
    }
    assert_eq!(client.pending_requests(), 0);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_empty_server_advertises_nothing() {
    let connection = connect(Server::new(ServerInfo::new("empty")), ClientConfig::default());
    let client = connection.client.clone();

    let init = client.initialize().await.unwrap();
    assert!(init.capabilities.is_empty());
    assert!(client.list_tools().await.unwrap().is_empty());

    connection.shutdown().await;
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let (client_io, _server_io) = tokio::io::duplex(1024);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (reader, writer) = StdioTransport::new(client_read, client_write).split();

    let config = ClientConfig { request_timeout: Duration::from_millis(100), ..ClientConfig::default() };
    let client = Arc::new(Client::new(writer, config));
    let _reader_task = spawn_reader(reader, client.clone());

    let err = client.initialize().await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(client.pending_requests(), 0);
    assert!(!client.is_initialized());
}
