//! MCP Error Types
//!
//! This module defines the error type shared by the framing transport, the
//! server dispatcher and the client correlator, along with the fixed set of
//! JSON-RPC error codes carried on the wire.

use std::fmt;

use thiserror::Error;

use crate::messages::ErrorData;

/// Standard JSON-RPC 2.0 error codes understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Invalid JSON was received
    ParseError = -32700,
    /// The JSON sent is not a valid request object
    InvalidRequest = -32600,
    /// The method, tool or prompt does not exist
    MethodNotFound = -32601,
    /// Invalid method parameters
    InvalidParams = -32602,
    /// Internal error, including handler failures
    InternalError = -32603,
}

impl ErrorCode {
    /// Numeric value as sent on the wire
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -32700 => Ok(ErrorCode::ParseError),
            -32600 => Ok(ErrorCode::InvalidRequest),
            -32601 => Ok(ErrorCode::MethodNotFound),
            -32602 => Ok(ErrorCode::InvalidParams),
            -32603 => Ok(ErrorCode::InternalError),
            other => Err(other),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::ParseError => "ParseError",
            ErrorCode::InvalidRequest => "InvalidRequest",
            ErrorCode::MethodNotFound => "MethodNotFound",
            ErrorCode::InvalidParams => "InvalidParams",
            ErrorCode::InternalError => "InternalError",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// The main Error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-related errors (closed pipes, child process failures)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed header or truncated body on the wire
    #[error("Framing error: {0}")]
    Framing(String),

    /// The peer answered with an `error` object
    #[error("Protocol error: {}", .0.message)]
    Protocol(ErrorData),

    /// No matching response arrived within the configured window
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A client operation was attempted before `initialize` succeeded
    #[error("Client not initialized. Call initialize first.")]
    NotInitialized,

    /// `initialize` was called on an already initialized client
    #[error("Client already initialized")]
    AlreadyInitialized,

    /// Unknown method, tool or prompt
    #[error("{0}")]
    MethodNotFound(String),

    /// Missing or structurally invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A registered handler failed
    #[error("{0}")]
    Handler(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// JSON-RPC error code used when this error is reported to a peer
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Json(_) => ErrorCode::ParseError,
            Error::Framing(_) => ErrorCode::ParseError,
            Error::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Error::InvalidParams(_) => ErrorCode::InvalidParams,
            Error::Protocol(data) => {
                ErrorCode::try_from(data.code).unwrap_or(ErrorCode::InternalError)
            }
            Error::NotInitialized | Error::AlreadyInitialized => ErrorCode::InvalidRequest,
            Error::Io(_)
            | Error::Transport(_)
            | Error::Timeout(_)
            | Error::Handler(_)
            | Error::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this is a timeout waiting for a response
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Convert into the `error` object of a response
    pub fn to_error_data(&self) -> ErrorData {
        match self {
            Error::Protocol(data) => data.clone(),
            other => ErrorData::new(other.code(), other.to_string()),
        }
    }
}

impl From<ErrorData> for Error {
    fn from(data: ErrorData) -> Self {
        Error::Protocol(data)
    }
}
