//! # MCP Stream Core
//!
//! `mcp-stream-core` is a client for Model Context Protocol servers reachable
//! over Streamable HTTP: JSON-RPC 2.0 messages POSTed to a single endpoint,
//! answered with either a JSON body or an event stream of `data:` lines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcp_stream_core::{ClientConfig, HttpStreamConfig, McpClient, ToolInvoker};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpStreamConfig::from_url("https://mcp.deepwiki.com/mcp")?;
//!     let mut client = McpClient::connect_http(http, ClientConfig::default())?;
//!
//!     client.initialize().await?;
//!     let answer = client
//!         .invoke(
//!             "ask_question",
//!             json!({"repoName": "openai/codex", "question": "What is Codex?"}),
//!         )
//!         .await?;
//!     println!("{answer}");
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`messages`] and [`codec`]: JSON-RPC message types and their wire form
//! - [`reader`]: turns a streamed response body into the one response that
//!   answers a request
//! - [`transport`]: the HTTP POST seam, session header and connection leases
//! - [`session`]: session id, negotiated capabilities, lifecycle state
//! - [`client`]: the `Uninitialized -> Initializing -> Ready` state machine
//! - [`config`]: file-backed configuration
//! - [`error`]: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod messages;
pub mod reader;
pub mod session;
pub mod transport;

// Re-export commonly used types for convenience
pub use client::{ClientConfig, ClientStats, McpClient, ToolInvoker};
pub use config::McpConfig;
pub use error::{McpError, McpResult};
pub use messages::{
    CallToolResult, Implementation, InitializeResult, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId, Tool, ToolContent,
};
pub use session::{Session, SessionState};
pub use transport::{AuthConfig, HttpStreamConfig, HttpStreamTransport, Transport, TransportInfo};

/// Current version of the mcp-stream-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP protocol version requested by default
pub const PROTOCOL_VERSION: &str = "2024-11-05";
