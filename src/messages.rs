//! MCP Message Types
//!
//! This module defines the JSON-RPC 2.0 envelope used on the wire: requests,
//! responses and notifications. Messages convert to and from the generic
//! `serde_json::Value` form produced by the framing transport.

use serde::{ Deserialize, Serialize };
use serde_json::Value;

use crate::errors::{ Error, ErrorCode };

/// JSON-RPC version emitted on every message
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifiers are positive integers assigned by the sender
pub type RequestId = i64;

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// The top-level Message enum for handling JSON-RPC 2.0 messages
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
    Notification(Notification),
}

/// A request expecting exactly one response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    /// JSON-RPC version, always "2.0" when we send it
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Request ID
    pub id: RequestId,
    /// Method name (e.g., "tools/call")
    pub method: String,
    /// Optional parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a new request
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Response for a JSON-RPC request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    /// JSON-RPC version, always "2.0" when we send it
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// ID from the request, `null` when the request could not be identified
    pub id: Option<RequestId>,
    /// Either a result or an error
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
}

impl Response {
    /// Create a successful response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: Some(id),
            outcome: ResponseOutcome::Success { result },
        }
    }

    /// Create an error response
    pub fn error(id: Option<RequestId>, error: ErrorData) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            outcome: ResponseOutcome::Error { error },
        }
    }

    /// Consume the response, turning an `error` object into `Error::Protocol`
    pub fn into_result(self) -> Result<Value, Error> {
        match self.outcome {
            ResponseOutcome::Success { result } => Ok(result),
            ResponseOutcome::Error { error } => Err(Error::Protocol(error)),
        }
    }
}

/// Represents either a successful result or an error, never both
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ResponseOutcome {
    /// Success case with a result
    Success {
        result: Value,
    },
    /// Error case with error details
    Error {
        error: ErrorData,
    },
}

/// Error information for failed requests
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorData {
    /// Error code (e.g., -32600 for Invalid Request)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    /// Create error data without additional payload
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach additional data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The code as one of the known error codes, if it is one
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::try_from(self.code).ok()
    }
}

/// Notification is a request without an expected response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// JSON-RPC version, always "2.0" when we send it
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Optional parameters for the notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Create a new notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            method: method.into(),
            params,
        }
    }
}

impl Message {
    /// Request or response id, if the message carries one
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Message::Request(request) => Some(request.id),
            Message::Response(response) => response.id,
            Message::Notification(_) => None,
        }
    }

    /// Classify a decoded frame
    pub fn from_value(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(Error::Json)
    }

    /// Convert into the generic key-value form
    pub fn to_value(&self) -> Result<Value, Error> {
        serde_json::to_value(self).map_err(Error::Json)
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Message::Notification(notification)
    }
}

// Distinguish responses, requests and notifications by their fields
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: serde::de::Deserializer<'de>
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;

        if value.get("result").is_some() && value.get("error").is_some() {
            Err(D::Error::custom("Response carries both result and error"))
        } else if value.get("result").is_some() || value.get("error").is_some() {
            let response: Response = serde_json
                ::from_value(value)
                .map_err(|e| D::Error::custom(e.to_string()))?;
            Ok(Message::Response(response))
        } else if value.get("method").is_some() && value.get("id").is_some() {
            let request: Request = serde_json
                ::from_value(value)
                .map_err(|e| D::Error::custom(e.to_string()))?;
            Ok(Message::Request(request))
        } else if value.get("method").is_some() {
            let notification: Notification = serde_json
                ::from_value(value)
                .map_err(|e| D::Error::custom(e.to_string()))?;
            Ok(Message::Notification(notification))
        } else {
            Err(D::Error::custom("Invalid JSON-RPC message format"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(1, "test", Some(json!({ "foo": "bar" })));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": 1, "method": "test", "params": { "foo": "bar" } }));
    }

    #[test]
    fn test_request_without_params_omits_key() {
        let value = serde_json::to_value(Request::new(7, "tools/list", None)).unwrap();
        assert!(value.get("params").is_none());
    }

    #[test]
    fn test_response_with_result() {
        let value = serde_json::to_value(Response::success(1, json!({ "status": "ok" }))).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1);
        assert_eq!(value["result"], json!({ "status": "ok" }));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_response_with_error() {
        let error = ErrorData::new(ErrorCode::InvalidRequest, "Invalid Request");
        let value = serde_json::to_value(Response::error(Some(1), error)).unwrap();

        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32600);
        assert_eq!(value["error"]["message"], "Invalid Request");
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_response_with_null_id() {
        let error = ErrorData::new(ErrorCode::InvalidRequest, "Invalid message format");
        let value = serde_json::to_value(Response::error(None, error)).unwrap();
        assert_eq!(value["id"], Value::Null);
    }

    #[test]
    fn test_notification_serialization() {
        let value = serde_json
            ::to_value(Notification::new("notify", Some(json!({ "event": "test" }))))
            .unwrap();

        assert_eq!(value, json!({ "jsonrpc": "2.0", "method": "notify", "params": { "event": "test" } }));
    }

    #[test]
    fn test_classify_messages() {
        let request = Message::from_value(json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" })).unwrap();
        assert!(matches!(request, Message::Request(ref r) if r.id == 3 && r.method == "ping"));

        let notification = Message::from_value(json!({ "method": "notifications/initialized" })).unwrap();
        assert!(matches!(notification, Message::Notification(_)));
        assert_eq!(notification.id(), None);

        let response = Message::from_value(json!({ "jsonrpc": "2.0", "id": 3, "result": null })).unwrap();
        match response {
            Message::Response(r) => {
                assert_eq!(r.id, Some(3));
                assert_eq!(r.outcome, ResponseOutcome::Success { result: Value::Null });
            }
            other => panic!("expected response, got {:?}", other),
        }

        assert!(Message::from_value(json!({ "id": 1 })).is_err());
    }

    #[test]
    fn test_response_with_result_and_error_is_rejected() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": "ok",
            "error": { "code": -32603, "message": "boom" }
        });
        let err = Message::from_value(frame).unwrap_err();
        assert!(err.to_string().contains("both result and error"));
    }

    #[test]
    fn test_error_response_into_result() {
        let response = Message::from_value(
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "error": { "code": -32601, "message": "Method not found: x" }
            })
        ).unwrap();

        let Message::Response(response) = response else {
            panic!("expected response");
        };
        match response.into_result() {
            Err(Error::Protocol(data)) => {
                assert_eq!(data.error_code(), Some(ErrorCode::MethodNotFound));
                assert_eq!(data.message, "Method not found: x");
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }
}
