//! Initialization handshake payloads.
//!
//! 1. Client sends `initialize` with protocol version, capabilities, client info
//! 2. Server responds with its capabilities (and usually `serverInfo`)
//! 3. Client sends `notifications/initialized`

use super::{ClientCapabilities, Implementation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeParams {
    /// Protocol version requested by the client
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Capabilities offered by the client
    pub capabilities: ClientCapabilities,

    /// Information about the client implementation
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

impl InitializeParams {
    /// Create new initialize parameters.
    pub fn new(
        protocol_version: impl Into<String>,
        capabilities: ClientCapabilities,
        client_info: Implementation,
    ) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            capabilities,
            client_info,
        }
    }
}

/// Result of the `initialize` request.
///
/// Only `capabilities` is required. Capabilities are kept as the raw JSON the
/// server sent, since the client stores them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Capabilities offered by the server, verbatim
    pub capabilities: Value,

    /// Protocol version the server chose
    #[serde(
        rename = "protocolVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub protocol_version: Option<String>,

    /// Information about the server implementation
    #[serde(rename = "serverInfo", default, skip_serializing_if = "Option::is_none")]
    pub server_info: Option<Implementation>,

    /// Optional usage instructions for the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Any other result members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InitializeResult {
    /// Whether the server advertised the `tools` capability.
    pub fn supports_tools(&self) -> bool {
        self.capabilities.get("tools").is_some()
    }
}
