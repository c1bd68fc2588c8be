//! MCP message types: the JSON-RPC envelope plus the typed payloads of the
//! handshake and tool operations.
//!
//! - [`core`]: request / notification / response envelope
//! - [`initialization`]: `initialize` params and result
//! - [`tools`]: `tools/list` and `tools/call` payloads

pub mod core;
pub mod initialization;
pub mod tools;

pub use self::core::*;
pub use self::initialization::*;
pub use self::tools::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Method names used by the client.
pub mod methods {
    /// Capability handshake request
    pub const INITIALIZE: &str = "initialize";
    /// Handshake completion notification
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Tool discovery
    pub const TOOLS_LIST: &str = "tools/list";
    /// Tool invocation
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Capabilities this client advertises in `initialize`.
///
/// Fixed for the life of a session. Unknown keys can be added through
/// `experimental`, which is flattened into the capabilities object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Client can provide filesystem roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,

    /// Client can service sampling requests (advertised as an empty object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<serde_json::Value>,

    /// Custom or experimental capabilities
    #[serde(flatten)]
    pub experimental: HashMap<String, serde_json::Value>,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        Self {
            roots: Some(RootsCapability {
                list_changed: Some(true),
            }),
            sampling: Some(serde_json::json!({})),
            experimental: HashMap::new(),
        }
    }
}

/// Roots-related capabilities (client-side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RootsCapability {
    /// Whether the client emits roots list-changed notifications
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Implementation information for client or server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name of the implementation
    pub name: String,

    /// Version of the implementation
    pub version: String,

    /// Additional implementation metadata
    #[serde(flatten)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Implementation {
    /// Create a new implementation info structure.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add custom metadata to the implementation info.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for Implementation {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_client_capabilities_wire_shape() {
        let value = serde_json::to_value(ClientCapabilities::default()).unwrap();
        assert_eq!(value, json!({"roots": {"listChanged": true}, "sampling": {}}));
    }

    #[test]
    fn test_experimental_capabilities_are_flattened() {
        let mut capabilities = ClientCapabilities::default();
        capabilities
            .experimental
            .insert("elicitation".to_string(), json!({}));

        let value = serde_json::to_value(&capabilities).unwrap();
        assert_eq!(value["elicitation"], json!({}));
    }

    #[test]
    fn test_implementation_creation() {
        let impl_info = Implementation::new("deepwiki-demo", "1.0.0")
            .with_metadata("platform", json!("rust"));

        assert_eq!(impl_info.name, "deepwiki-demo");
        assert_eq!(impl_info.version, "1.0.0");
        assert_eq!(impl_info.metadata.get("platform").unwrap(), &json!("rust"));

        let value = serde_json::to_value(&impl_info).unwrap();
        assert_eq!(value["platform"], "rust");
    }
}
