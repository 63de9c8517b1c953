//! MCP Client Implementation
//!
//! This module provides the request/response correlator for talking to an
//! MCP server over a framed stream, plus the helpers that connect it to a
//! server running as a child process.

pub mod client;
pub mod request;
pub mod stdio;

pub use client::{ Client, ClientBuilder, ClientConfig, DEFAULT_REQUEST_TIMEOUT };
pub use request::RequestManager;
pub use stdio::{ StdioClient, StdioServerParams, connect, spawn_reader };

#[cfg(test)]
pub mod tests;
