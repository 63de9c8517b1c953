//! Echo server over stdio
//!
//! Every tool, resource and prompt echoes its input back.

use mcp_stdio::types::{ Prompt, PromptArgument, Resource, Tool };
use mcp_stdio::{ Error, Server };
use serde_json::{ Value, json };

fn message(args: &[Value]) -> String {
    args.first()
        .map(|value| {
            match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }
        })
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let server = Server::builder()
        .with_name("Echo")
        .with_tool(
            Tool::new("echo")
                .with_description("Echo a message back")
                .with_input_schema(
                    json!({
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                })
                ),
            |args| Ok(json!(format!("Tool echo: {}", message(&args))))
        )
        .with_resource(
            Resource::new("echo://{message}").with_description("Echo a message as a resource"),
            |args| Ok(json!(format!("Resource echo: {}", message(&args))))
        )
        .with_prompt(
            Prompt::new("echo")
                .with_description("Create an echo prompt")
                .with_argument(PromptArgument::new("message").required(true)),
            |args| Ok(json!(format!("Please process this message: {}", message(&args))))
        )
        .build();

    tracing::info!("Starting Echo MCP server");
    server.run_stdio().await
}
