//! Configuration of the Streamable HTTP transport.
//!
//! # Examples
//!
//! ```rust
//! use mcp_stream_core::transport::{AuthConfig, HttpStreamConfig};
//! use std::time::Duration;
//!
//! let config = HttpStreamConfig::new("https://mcp.deepwiki.com/mcp".parse().unwrap())
//!     .header("X-Client", "docs")
//!     .auth(AuthConfig::bearer("secret"))
//!     .connect_timeout(Duration::from_secs(5));
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{ConfigError, McpResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Configuration for the Streamable HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStreamConfig {
    /// Full URL of the server's MCP endpoint, used as-is for every POST
    pub endpoint: Url,

    /// Timeout for establishing the TCP/TLS connection
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Skip TLS certificate verification. Only for local test servers.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Additional HTTP headers sent with every POST
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Authentication configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

impl HttpStreamConfig {
    /// Create a configuration for `endpoint` with defaults for everything else.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            connect_timeout: default_connect_timeout(),
            accept_invalid_certs: false,
            headers: HashMap::new(),
            auth: None,
        }
    }

    /// Parse `endpoint` and create a configuration for it.
    pub fn from_url(endpoint: impl AsRef<str>) -> McpResult<Self> {
        let endpoint = endpoint
            .as_ref()
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                parameter: "endpoint".to_string(),
                value: endpoint.as_ref().to_string(),
                reason: format!("Invalid URL: {}", e),
            })?;
        Ok(Self::new(endpoint))
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add an HTTP header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set authentication configuration.
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Allow self-signed or otherwise invalid TLS certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Validate the transport configuration.
    pub fn validate(&self) -> McpResult<()> {
        if self.endpoint.scheme() != "http" && self.endpoint.scheme() != "https" {
            return Err(ConfigError::InvalidValue {
                parameter: "endpoint".to_string(),
                value: self.endpoint.to_string(),
                reason: "URL must use http or https scheme".to_string(),
            }
            .into());
        }

        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                parameter: "connect_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            }
            .into());
        }

        if let Some(ref auth) = self.auth {
            auth.validate()?;
        }

        Ok(())
    }
}

/// Authentication attached to every POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum AuthConfig {
    /// HTTP Basic Authentication
    Basic { username: String, password: String },

    /// Bearer token authentication
    Bearer { token: String },

    /// Custom header-based authentication
    Header { name: String, value: String },
}

impl AuthConfig {
    /// Create a new basic authentication configuration.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create a new bearer token authentication configuration.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Create a new custom header authentication configuration.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Validate the authentication configuration.
    pub fn validate(&self) -> McpResult<()> {
        let (kind, empty) = match self {
            Self::Basic { username, password } => ("basic", username.is_empty() || password.is_empty()),
            Self::Bearer { token } => ("bearer", token.is_empty()),
            Self::Header { name, value } => ("header", name.is_empty() || value.is_empty()),
        };

        if empty {
            return Err(ConfigError::InvalidValue {
                parameter: "auth".to_string(),
                value: kind.to_string(),
                reason: "Credentials cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
