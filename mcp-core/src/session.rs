//! Per-connection session state.
//!
//! A [`Session`] is owned by exactly one [`McpClient`](crate::client::McpClient).
//! The transport reads it (to attach the session id) but never writes it; the
//! client adopts a server-offered session id only after an exchange has
//! completed.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::messages::{ClientCapabilities, Implementation, InitializeResult};

/// Header carrying the server-assigned session id.
pub const SESSION_ID_HEADER: &str = "Mcp-Session-Id";

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No handshake has been attempted, or the last one failed
    Uninitialized,
    /// `initialize` is in flight
    Initializing,
    /// Handshake complete; tool operations are permitted
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Ready => write!(f, "ready"),
        }
    }
}

/// Everything the client knows about its conversation with one server.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    endpoint: Url,
    session_id: String,
    client_capabilities: ClientCapabilities,
    server_capabilities: Value,
    protocol_version: Option<String>,
    server_info: Option<Implementation>,
    instructions: Option<String>,
    state: SessionState,
}

impl Session {
    /// Create an empty session for `endpoint`.
    pub fn new(endpoint: Url, client_capabilities: ClientCapabilities) -> Self {
        Self {
            endpoint,
            session_id: String::new(),
            client_capabilities,
            server_capabilities: Value::Null,
            protocol_version: None,
            server_info: None,
            instructions: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Server endpoint this session talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Server-assigned session id; empty until the server supplies one.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether a session id has been adopted.
    pub fn has_session_id(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Capabilities advertised by this client.
    pub fn client_capabilities(&self) -> &ClientCapabilities {
        &self.client_capabilities
    }

    /// Capabilities the server returned, verbatim. `Null` before initialize.
    pub fn server_capabilities(&self) -> &Value {
        &self.server_capabilities
    }

    /// Protocol version the server chose, when it said.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Server implementation info, when offered.
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// Server usage instructions, when offered.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once the handshake has completed.
    pub fn initialized(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Adopt a server-offered session id. Empty offers are ignored.
    pub(crate) fn adopt_session_id(&mut self, offered: Option<String>) -> bool {
        match offered {
            Some(id) if !id.is_empty() && id != self.session_id => {
                self.session_id = id;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn record_handshake(&mut self, result: &InitializeResult) {
        self.server_capabilities = result.capabilities.clone();
        self.protocol_version = result.protocol_version.clone();
        self.server_info = result.server_info.clone();
        self.instructions = result.instructions.clone();
    }

    /// Forget everything learned from the server.
    pub(crate) fn reset(&mut self) {
        self.session_id.clear();
        self.server_capabilities = Value::Null;
        self.protocol_version = None;
        self.server_info = None;
        self.instructions = None;
        self.state = SessionState::Uninitialized;
    }
}
