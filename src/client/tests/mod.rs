//! Tests for the MCP client
