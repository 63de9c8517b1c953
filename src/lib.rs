//! MCP over stdio
//!
//! This crate provides a minimal implementation of the Model Context Protocol
//! (MCP): JSON-RPC 2.0 messages carried as `Content-Length` framed JSON over a
//! byte stream, normally the stdin/stdout of a child process. It includes a
//! server dispatcher with tool, resource and prompt registries, and a client
//! that correlates requests with their responses.

pub mod client;
pub mod errors;
pub mod messages;
pub mod server;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use client::{ Client, ClientBuilder, ClientConfig, StdioClient, StdioServerParams };
pub use errors::{ Error, ErrorCode };
pub use messages::{ ErrorData, Message, Notification, Request, RequestId, Response };
pub use server::{ Server, ServerBuilder, ServerInfo };
pub use transport::{ FrameReader, FrameWriter, StdioTransport, Transport };
