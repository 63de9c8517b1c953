//! Client example
//!
//! Spawns the calculator demo through cargo and exercises every client
//! operation against it.

use std::time::Duration;

use mcp_stdio::client::{ ClientConfig, StdioServerParams, connect };
use mcp_stdio::Error;
use serde_json::json;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(Level::WARN).init();

    let params = StdioServerParams::new("cargo").with_args([
        "run",
        "--quiet",
        "--example",
        "calculator_server",
    ]);
    let config = ClientConfig {
        request_timeout: Duration::from_secs(120),
        ..ClientConfig::default()
    };

    println!("Starting calculator server...");
    let client = connect(params, config).await?;

    println!("Initializing connection...");
    let init = client.initialize().await?;
    println!("Connected to {} {}", init.server_info.name, init.server_info.version);

    println!("\nAvailable tools:");
    for tool in client.list_tools().await? {
        println!("  - {}: {}", tool.name, tool.description.unwrap_or_default());
    }

    println!("\nCalculating 5 + 3...");
    let result = client.call_tool("add", json!({ "a": 5, "b": 3 })).await?;
    println!("Result: {}", result.text().unwrap_or_default());

    println!("\nCalculating 10 * 4...");
    let result = client.call_tool("multiply", json!({ "a": 10, "b": 4 })).await?;
    println!("Result: {}", result.text().unwrap_or_default());

    println!("\nCalculating 1 / 0...");
    match client.call_tool("divide", json!({ "a": 1, "b": 0 })).await {
        Ok(result) => println!("Result: {}", result.text().unwrap_or_default()),
        Err(e) => println!("Error: {}", e),
    }

    println!("\nAvailable resources:");
    for resource in client.list_resources().await? {
        println!("  - {}: {}", resource.uri, resource.description.unwrap_or_default());
    }

    let history = client.read_resource("history://recent").await?;
    println!("\nHistory: {}", history.text().unwrap_or_default());

    println!("\nAvailable prompts:");
    for prompt in client.list_prompts().await? {
        println!("  - {}: {}", prompt.name, prompt.description.unwrap_or_default());
    }

    println!("\nGetting calculation prompt...");
    let prompt = client.get_prompt("calculate", json!({ "expression": "2 * (3 + 4)" })).await?;
    println!("Prompt: {}", prompt.text().unwrap_or_default());

    client.shutdown().await?;
    println!("\nClient example completed!");
    Ok(())
}
