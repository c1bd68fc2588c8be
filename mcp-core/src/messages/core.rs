//! Core JSON-RPC 2.0 message structures.
//!
//! The three message shapes are distinct types joined by [`JsonRpcMessage`]:
//!
//! - **Request**: expects a response, carries a unique [`RequestId`]
//! - **Notification**: fire-and-forget, no id
//! - **Response**: answers a request with exactly one of `result` or `error`
//!
//! A response's outcome is a [`ResponseOutcome`] enum, so a value that carries
//! both a result and an error (or neither) cannot be constructed. Decoding
//! from the wire lives in [`crate::codec`].
//!
//! # Examples
//!
//! ```rust
//! use mcp_stream_core::messages::{JsonRpcRequest, JsonRpcResponse, JsonRpcError};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new("tools/list", json!({}));
//!
//! let success = JsonRpcResponse::success(request.id().clone(), json!({"tools": []}));
//! assert!(success.is_success());
//!
//! let failure = JsonRpcResponse::error(request.id().clone(), JsonRpcError::method_not_found());
//! assert!(failure.is_error());
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ProtocolError;

/// The literal `"jsonrpc": "2.0"` member every message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl JsonRpcVersion {
    /// The only supported version string.
    pub const V2: &'static str = "2.0";
}

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::V2)
    }
}

/// JSON-RPC 2.0 request message.
///
/// Immutable once built: the id is generated by [`JsonRpcRequest::new`] and
/// never changes. Serializes as `{"jsonrpc","method","params","id"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    jsonrpc: JsonRpcVersion,
    method: String,
    params: Value,
    id: RequestId,
}

impl JsonRpcRequest {
    /// Create a request with a fresh random (UUID v4) id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), method, params)
    }

    /// Create a request with an explicit id.
    ///
    /// Used when decoding and in tests; callers issuing requests should prefer
    /// [`JsonRpcRequest::new`] so ids are never reused.
    pub fn with_id(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params: normalize_params(params),
            id: id.into(),
        }
    }

    /// The request id.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Get the parameters as a specific type.
    pub fn params_as<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(self.params.clone())
    }
}

/// JSON-RPC 2.0 notification message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    jsonrpc: JsonRpcVersion,
    method: String,
    params: Value,
}

impl JsonRpcNotification {
    /// Create a new notification.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mcp_stream_core::messages::JsonRpcNotification;
    /// use serde_json::json;
    ///
    /// let notification = JsonRpcNotification::new("notifications/initialized", json!({}));
    /// assert_eq!(notification.method(), "notifications/initialized");
    /// ```
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params: normalize_params(params),
        }
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The notification parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }
}

/// Missing parameters go on the wire as an empty object.
fn normalize_params(params: Value) -> Value {
    match params {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// JSON-RPC 2.0 response message.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    /// ID from the corresponding request
    pub id: RequestId,

    /// Exactly one of result or error
    pub outcome: ResponseOutcome,
}

/// The mutually exclusive payload of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Success result
    Result(Value),
    /// Error object
    Error(JsonRpcError),
}

impl JsonRpcResponse {
    /// Create a successful response with the given result.
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: id.into(),
            outcome: ResponseOutcome::Result(result),
        }
    }

    /// Create an error response with the given error.
    pub fn error(id: impl Into<RequestId>, error: JsonRpcError) -> Self {
        Self {
            id: id.into(),
            outcome: ResponseOutcome::Error(error),
        }
    }

    /// Check if this response represents a success.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Result(_))
    }

    /// Check if this response represents an error.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }

    /// Borrow the result, if this is a success.
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(result) => Some(result),
            ResponseOutcome::Error(_) => None,
        }
    }

    /// Borrow the error, if this is a failure.
    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            ResponseOutcome::Error(error) => Some(error),
            ResponseOutcome::Result(_) => None,
        }
    }

    /// Split into the result value or the server's error as a [`ProtocolError`].
    pub fn into_result(self) -> Result<Value, ProtocolError> {
        match self.outcome {
            ResponseOutcome::Result(result) => Ok(result),
            ResponseOutcome::Error(error) => Err(ProtocolError {
                code: error.code,
                message: error.message,
                data: error.data,
                method: None,
            }),
        }
    }
}

impl Serialize for JsonRpcResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", &JsonRpcVersion)?;
        map.serialize_entry("id", &self.id)?;
        match &self.outcome {
            ResponseOutcome::Result(result) => map.serialize_entry("result", result)?,
            ResponseOutcome::Error(error) => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i64,

    /// Human-readable error message
    pub message: String,

    /// Additional error data (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error.
    pub fn new(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// "Parse error" (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error", None)
    }

    /// "Invalid Request" (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "Invalid Request", None)
    }

    /// "Method not found" (-32601).
    pub fn method_not_found() -> Self {
        Self::new(-32601, "Method not found", None)
    }

    /// "Invalid params" (-32602).
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(-32602, "Invalid params", Some(Value::String(details.into())))
    }

    /// "Internal error" (-32603).
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::new(-32603, "Internal error", Some(Value::String(details.into())))
    }

    /// Check if this is a standard JSON-RPC error (vs application-specific).
    pub fn is_standard_error(&self) -> bool {
        matches!(self.code, -32700..=-32600)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " ({data})")?;
        }
        Ok(())
    }
}

/// Request ID for JSON-RPC messages.
///
/// Requests built by this crate always use string ids; number and null exist
/// so any id a server echoes back can be represented and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Null identifier
    Null,
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Any JSON-RPC message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request message
    Request(JsonRpcRequest),
    /// Response message
    Response(JsonRpcResponse),
    /// Notification message
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Get the method name if this is a request or notification.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(req) => Some(req.method()),
            Self::Notification(notif) => Some(notif.method()),
            Self::Response(_) => None,
        }
    }

    /// Get the request ID if this is a request or response.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(req.id()),
            Self::Response(resp) => Some(&resp.id),
            Self::Notification(_) => None,
        }
    }

    /// Check if this message expects a response.
    pub fn expects_response(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Notification(_) => "notification",
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(req: JsonRpcRequest) -> Self {
        Self::Request(req)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Response(resp)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notif: JsonRpcNotification) -> Self {
        Self::Notification(notif)
    }
}
