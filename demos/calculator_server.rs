//! Calculator server over stdio
//!
//! Run with `cargo run --example calculator_server`; logs go to stderr.

use std::sync::{ Arc, Mutex };

use anyhow::anyhow;
use mcp_stdio::types::{ Prompt, PromptArgument, Resource, Tool };
use mcp_stdio::{ Error, Server, ServerInfo };
use schemars::JsonSchema;
use serde_json::{ Value, json };
use tracing::Level;

/// Operands of a binary operation
#[allow(dead_code)]
#[derive(JsonSchema)]
struct BinaryArgs {
    /// Left operand
    a: f64,
    /// Right operand
    b: f64,
}

type History = Arc<Mutex<Vec<String>>>;

fn operand(args: &[Value], index: usize) -> anyhow::Result<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Operand {} must be a number", index + 1))
}

fn record(history: &History, entry: String) -> anyhow::Result<()> {
    let mut history = history.lock().map_err(|_| anyhow!("History unavailable"))?;
    history.push(entry);
    Ok(())
}

async fn register_operation<F>(server: &Server, history: &History, name: &str, description: &str, op: F)
    where F: Fn(f64, f64) -> anyhow::Result<f64> + Send + Sync + 'static
{
    let history = history.clone();
    let symbol = name.to_string();
    server.register_tool(
        Tool::new(name).with_description(description).with_input_type::<BinaryArgs>(),
        move |args| {
            let (a, b) = (operand(&args, 0)?, operand(&args, 1)?);
            let result = op(a, b)?;
            record(&history, format!("{} {} {} = {}", symbol, a, b, result))?;
            Ok(json!(result))
        }
    ).await;
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(Level::INFO).init();

    let server = Server::new(ServerInfo::new("Calculator"));
    let history: History = Arc::new(Mutex::new(Vec::new()));

    register_operation(&server, &history, "add", "Add two numbers", |a, b| Ok(a + b)).await;
    register_operation(&server, &history, "subtract", "Subtract two numbers", |a, b| Ok(a - b)).await;
    register_operation(&server, &history, "multiply", "Multiply two numbers", |a, b| Ok(a * b)).await;
    register_operation(&server, &history, "divide", "Divide two numbers", |a, b| {
        if b == 0.0 {
            return Err(anyhow!("Division by zero"));
        }
        Ok(a / b)
    }).await;

    let recent = history.clone();
    server.register_resource(
        Resource::new("history://recent").with_description("Recent calculation history"),
        move |_| {
            let history = recent.lock().map_err(|_| anyhow!("History unavailable"))?;
            let start = history.len().saturating_sub(10);
            Ok(json!(history[start..].to_vec()))
        }
    ).await;

    server.register_prompt(
        Prompt::new("calculate")
            .with_description("Perform a complex calculation")
            .with_argument(
                PromptArgument::new("expression")
                    .with_description("Expression to evaluate")
                    .required(true)
            ),
        |args| {
            let expression = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("Please calculate the following expression: {}", expression)))
        }
    ).await;

    tracing::info!("Starting Calculator MCP server");
    server.run_stdio().await
}
