//! Error types for the Streamable HTTP MCP client.
//!
//! Every failure the client can report is one of a small number of distinct,
//! inspectable kinds:
//!
//! - [`TransportError`]: the HTTP exchange itself failed (connect, non-2xx
//!   status, timeout, body read). Never retried by the client.
//! - [`ParseError`]: the response body did not contain a usable JSON-RPC
//!   payload. Carries the raw body for diagnosis.
//! - [`ProtocolError`]: the server answered with a well-formed JSON-RPC
//!   `error` object.
//! - [`StateError`]: the operation is not permitted in the current session
//!   state. Raised before anything is sent.
//!
//! Codec-level [`DecodeError`]s and configuration [`ConfigError`]s complete the
//! taxonomy.

use std::time::Duration;
use thiserror::Error;

use crate::messages::RequestId;
use crate::session::SessionState;

/// The main error type for all client operations.
///
/// # Examples
///
/// ```rust
/// use mcp_stream_core::error::{McpError, TransportError};
///
/// let error = McpError::Transport(TransportError::HttpStatus {
///     status_code: 503,
///     body: "upstream unavailable".to_string(),
/// });
///
/// assert_eq!(error.category(), "transport");
/// assert!(error.is_retryable());
/// ```
#[derive(Error, Debug)]
pub enum McpError {
    /// Transport-related errors (connection, status, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response stream did not yield a usable JSON-RPC payload
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The server returned a JSON-RPC error object
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Operation attempted outside its permitted session state
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// A single payload could not be decoded as a JSON-RPC message
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors (invalid config files, missing parameters, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A tool ran but flagged its own result as an error
    #[error("Tool '{tool}' reported an error: {message}")]
    ToolExecution {
        /// Name of the tool that was invoked
        tool: String,
        /// Text content returned alongside the error flag
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        /// The underlying serde_json error
        source: serde_json::Error,
    },

    /// IO errors (config files)
    #[error("IO error: {source}")]
    Io {
        #[from]
        /// The underlying IO error
        source: std::io::Error,
    },
}

/// Failures of the HTTP exchange itself.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum TransportError {
    /// Failed to establish a connection to the server
    #[error("Failed to connect to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The server answered with a non-2xx status
    #[error("HTTP error: {status_code} - {body}")]
    HttpStatus { status_code: u16, body: String },

    /// The request did not complete within the allotted time
    #[error("Operation '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// Generic network failure while sending the request
    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    /// The response body stream failed part-way through
    #[error("Failed to read response body: {reason}")]
    BodyReadFailed { reason: String },

    /// The HTTP client could not be constructed
    #[error("Invalid transport configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The transport connection has already been released
    #[error("Transport not connected: {reason}")]
    NotConnected { reason: String },
}

/// The response body did not contain a usable JSON-RPC payload.
#[derive(Error, Debug, Clone)]
#[error("{reason} (raw body: {raw:?})")]
pub struct ParseError {
    /// What went wrong
    pub reason: String,
    /// The raw accumulated response text
    pub raw: String,
}

impl ParseError {
    /// Create a parse error carrying the raw response body.
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// A well-formed JSON-RPC response carried an `error` object.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Server error {code}: {message}")]
pub struct ProtocolError {
    /// Machine-readable JSON-RPC error code
    pub code: i64,
    /// Human-readable message supplied by the server
    pub message: String,
    /// Optional additional data supplied by the server
    pub data: Option<serde_json::Value>,
    /// Method of the request that failed
    pub method: Option<String>,
}

/// Operation attempted outside its permitted session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum StateError {
    /// A Ready-only operation was attempted before the handshake completed
    #[error("Cannot {operation}: session not initialized (state: {state})")]
    NotInitialized {
        operation: String,
        state: SessionState,
    },

    /// `initialize` was attempted on a session that has already left Uninitialized
    #[error("Cannot initialize: session already in state {state}")]
    AlreadyInitialized { state: SessionState },
}

/// A single payload could not be decoded as a JSON-RPC message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DecodeError {
    #[error("malformed JSON: {reason}")]
    MalformedJson { reason: String },

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("unsupported jsonrpc version: {version}")]
    UnsupportedVersion { version: String },

    #[error("missing jsonrpc version")]
    MissingVersion,

    #[error("method must be a string")]
    InvalidMethod,

    #[error("invalid id: {id}")]
    InvalidId { id: String },

    #[error("response {id} carries both result and error")]
    ResultAndError { id: RequestId },

    #[error("payload is neither a request, a notification, nor a response")]
    UnrecognizedShape,

    #[error("malformed error object: {reason}")]
    InvalidErrorObject { reason: String },
}

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file has invalid format
    #[error("Invalid configuration format in {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    /// Configuration parameter has invalid value
    #[error("Invalid value for parameter '{parameter}': {value} - {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Convenience type alias for Results using McpError.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// Create a new timeout error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mcp_stream_core::error::McpError;
    /// use std::time::Duration;
    ///
    /// let error = McpError::timeout("tools/list", Duration::from_secs(30));
    /// assert_eq!(error.category(), "transport");
    /// ```
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Transport(TransportError::Timeout {
            operation: operation.into(),
            timeout,
        })
    }

    /// Check if retrying the same operation might succeed.
    ///
    /// The client itself never retries; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            McpError::Transport(transport_err) => transport_err.is_retryable(),
            McpError::Io { .. } => true,
            McpError::Parse(_) => false,
            McpError::Protocol(_) => false,
            McpError::State(_) => false,
            McpError::Decode(_) => false,
            McpError::Config(_) => false,
            McpError::ToolExecution { .. } => false,
            McpError::Serialization { .. } => false,
        }
    }

    /// Get the error category for this error.
    pub fn category(&self) -> &'static str {
        match self {
            McpError::Transport(_) => "transport",
            McpError::Parse(_) => "parse",
            McpError::Protocol(_) => "protocol",
            McpError::State(_) => "state",
            McpError::Decode(_) => "decode",
            McpError::Config(_) => "config",
            McpError::ToolExecution { .. } => "tool",
            McpError::Serialization { .. } => "serialization",
            McpError::Io { .. } => "io",
        }
    }

    /// The server-supplied error code, if this is a protocol error.
    pub fn protocol_code(&self) -> Option<i64> {
        match self {
            McpError::Protocol(err) => Some(err.code),
            _ => None,
        }
    }
}

impl TransportError {
    /// Check if this transport error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::NetworkError { .. } => true,
            TransportError::BodyReadFailed { .. } => true,
            TransportError::Timeout { .. } => true,
            TransportError::HttpStatus { status_code, .. } => {
                // 5xx errors are generally retryable, 4xx are not
                *status_code >= 500
            }
            TransportError::InvalidConfig { .. } => false,
            TransportError::NotConnected { .. } => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::ConnectionFailed {
                endpoint: err
                    .url()
                    .map(|url| url.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
                reason: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::BodyReadFailed {
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            TransportError::HttpStatus {
                status_code: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            TransportError::NetworkError {
                reason: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        McpError::Transport(err.into())
    }
}

impl From<url::ParseError> for McpError {
    fn from(err: url::ParseError) -> Self {
        McpError::Config(ConfigError::InvalidValue {
            parameter: "endpoint".to_string(),
            value: err.to_string(),
            reason: "Invalid URL format".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let error = McpError::timeout("tools/list", Duration::from_secs(30));
        assert_eq!(
            error.to_string(),
            "Transport error: Operation 'tools/list' timed out after 30s"
        );
    }

    #[test]
    fn test_protocol_error_display_and_code() {
        let error = McpError::Protocol(ProtocolError {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
            method: Some("tools/list".to_string()),
        });
        assert_eq!(error.protocol_code(), Some(-32601));
        assert_eq!(
            error.to_string(),
            "Protocol error: Server error -32601: Method not found"
        );
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let timeout = McpError::timeout("test", Duration::from_secs(30));
        assert_eq!(timeout.category(), "transport");

        let parse = McpError::Parse(ParseError::new("no payload", "garbage"));
        assert_eq!(parse.category(), "parse");

        let state = McpError::State(StateError::NotInitialized {
            operation: "tools/list".to_string(),
            state: SessionState::Uninitialized,
        });
        assert_eq!(state.category(), "state");
    }

    #[test]
    fn test_transport_error_retryable() {
        let server_error = TransportError::HttpStatus {
            status_code: 502,
            body: "bad gateway".to_string(),
        };
        assert!(server_error.is_retryable());

        let client_error = TransportError::HttpStatus {
            status_code: 404,
            body: "not found".to_string(),
        };
        assert!(!client_error.is_retryable());

        let closed = TransportError::NotConnected {
            reason: "disconnected".to_string(),
        };
        assert!(!closed.is_retryable());
    }

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let error = ParseError::new("no JSON-RPC payload", "event: ping\n");
        assert_eq!(error.raw, "event: ping\n");
        assert!(error.to_string().contains("event: ping"));
    }
}
