//! File-backed configuration.
//!
//! One [`McpConfig`] bundles the transport settings and the client settings.
//! The format follows the file extension: `.json`, `.yaml`/`.yml` or `.toml`.
//!
//! ```yaml
//! server:
//!   endpoint: https://mcp.deepwiki.com/mcp
//!   connect_timeout: 5s
//!   auth:
//!     type: bearer
//!     token: secret
//! client:
//!   request_timeout: 1m
//!   client_info:
//!     name: claude-deepwiki-integration
//!     version: 1.0.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;
use crate::error::{ConfigError, McpResult};
use crate::transport::HttpStreamConfig;

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    /// Where and how to connect
    pub server: HttpStreamConfig,

    /// Protocol-level client settings
    #[serde(default)]
    pub client: ClientConfig,
}

enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    fn of(path: &Path) -> McpResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::InvalidFormat {
                path: path.display().to_string(),
                reason: "Unsupported file format. Use .json, .yaml, or .toml".to_string(),
            }
            .into()),
        }
    }
}

impl McpConfig {
    /// Create a configuration with default client settings.
    pub fn new(server: HttpStreamConfig) -> Self {
        Self {
            server,
            client: ClientConfig::default(),
        }
    }

    /// Validate both halves of the configuration.
    pub fn validate(&self) -> McpResult<()> {
        self.server.validate()?;
        self.client.validate()
    }

    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> McpResult<Self> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|_e| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let invalid = |reason: String| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason,
        };

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?,
            Format::Yaml => serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?,
            Format::Toml => toml::from_str(&content).map_err(|e| invalid(e.to_string()))?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), endpoint = %config.server.endpoint, "Loaded configuration");
        Ok(config)
    }

    /// Save the configuration, choosing the format from the extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> McpResult<()> {
        let path = path.as_ref();
        let invalid = |reason: String| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason,
        };

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()))?,
            Format::Yaml => serde_yaml::to_string(self).map_err(|e| invalid(e.to_string()))?,
            Format::Toml => toml::to_string(self).map_err(|e| invalid(e.to_string()))?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }
}
