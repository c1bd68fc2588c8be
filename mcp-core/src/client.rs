//! MCP Client Implementation
//!
//! [`McpClient`] drives one session against one transport:
//!
//! ```text
//! Uninitialized --initialize()--> Initializing --ok--> Ready
//!       ^                              |
//!       +------- error / dropped ------+
//! ```
//!
//! Tool operations are only permitted in `Ready`; anything else fails with a
//! [`StateError`] before a byte is sent. Every operation takes `&mut self`, so
//! a session never has two requests in flight.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::McpConfig;
use crate::error::{McpError, McpResult, StateError};
use crate::messages::{
    methods, CallToolParams, CallToolResult, ClientCapabilities, Implementation,
    InitializeParams, InitializeResult, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult,
};
use crate::reader;
use crate::session::{Session, SessionState};
use crate::transport::{HttpStreamConfig, HttpStreamTransport, Transport, TransportInfo};
use crate::PROTOCOL_VERSION;

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

/// Configuration options for MCP client behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Protocol version requested in `initialize`
    pub protocol_version: String,

    /// Timeout for each request, body included (default: 30 seconds)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Timeout for the `initialize` exchange (default: 10 seconds)
    #[serde(with = "humantime_serde")]
    pub init_timeout: Duration,

    /// Identity sent as `clientInfo`
    pub client_info: Implementation,

    /// Capabilities advertised to the server
    pub capabilities: ClientCapabilities,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: default_protocol_version(),
            request_timeout: Duration::from_secs(30),
            init_timeout: Duration::from_secs(10),
            client_info: Implementation::default(),
            capabilities: ClientCapabilities::default(),
        }
    }
}

impl ClientConfig {
    /// Set the identity sent as `clientInfo`.
    pub fn client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = Implementation::new(name, version);
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the initialize timeout.
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Validate the client configuration.
    pub fn validate(&self) -> McpResult<()> {
        use crate::error::ConfigError;

        for (parameter, value) in [
            ("request_timeout", self.request_timeout),
            ("init_timeout", self.init_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    parameter: parameter.to_string(),
                    value: "0s".to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.client_info.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "client_info.name".to_string(),
                value: String::new(),
                reason: "Client name cannot be empty".to_string(),
            }
            .into());
        }

        if self.protocol_version.is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "protocol_version".to_string(),
                value: String::new(),
                reason: "Protocol version cannot be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Statistics about client operations.
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Number of requests sent
    pub requests_sent: u64,
    /// Number of responses received
    pub responses_received: u64,
    /// Number of notifications sent
    pub notifications_sent: u64,
    /// Number of failed operations
    pub errors: u64,
    /// Last activity timestamp
    pub last_activity: Option<Instant>,
}

impl ClientStats {
    fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }
}

/// The boundary an LLM collaborator calls tools through.
///
/// Implementors return the plain text of a tool's result; a result the tool
/// itself flags as an error becomes [`McpError::ToolExecution`].
#[async_trait]
pub trait ToolInvoker: Send {
    /// Invoke `name` with `arguments` and return its text output.
    async fn invoke(&mut self, name: &str, arguments: Value) -> McpResult<String>;
}

/// High-level MCP client for one Streamable HTTP server.
pub struct McpClient {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    session: Session,
    stats: ClientStats,
}

impl McpClient {
    /// Create a client over an existing transport.
    ///
    /// `endpoint` is recorded in the session for display; the transport
    /// decides where messages actually go.
    pub fn new(transport: Box<dyn Transport>, endpoint: url::Url, config: ClientConfig) -> Self {
        let session = Session::new(endpoint, config.capabilities.clone());
        Self {
            transport,
            config,
            session,
            stats: ClientStats::default(),
        }
    }

    /// Create a client with a [`HttpStreamTransport`] for `http`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use mcp_stream_core::client::{ClientConfig, McpClient};
    /// use mcp_stream_core::transport::HttpStreamConfig;
    ///
    /// # async fn example() -> mcp_stream_core::McpResult<()> {
    /// let http = HttpStreamConfig::from_url("https://mcp.deepwiki.com/mcp")?;
    /// let mut client = McpClient::connect_http(http, ClientConfig::default())?;
    ///
    /// client.initialize().await?;
    /// for tool in client.list_tools().await?.tools {
    ///     println!("{}: {}", tool.name, tool.description);
    /// }
    /// client.disconnect().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect_http(http: HttpStreamConfig, config: ClientConfig) -> McpResult<Self> {
        config.validate()?;
        let endpoint = http.endpoint.clone();
        let transport = HttpStreamTransport::new(http)?;
        Ok(Self::new(Box::new(transport), endpoint, config))
    }

    /// Create a client from a loaded configuration file.
    pub fn from_config(config: McpConfig) -> McpResult<Self> {
        config.validate()?;
        Self::connect_http(config.server, config.client)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Check if the client is ready for tool operations.
    pub fn is_ready(&self) -> bool {
        self.session.initialized()
    }

    /// The session this client owns.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get client operation statistics.
    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Get transport information and metadata.
    pub fn transport_info(&self) -> TransportInfo {
        self.transport.get_info()
    }

    /// Perform the capability handshake.
    ///
    /// Permitted only from `Uninitialized`. On success the server's
    /// capabilities and session id are recorded, `notifications/initialized`
    /// is sent (a failure there is logged, not returned) and the session
    /// becomes `Ready`. On any failure, or if this future is dropped, the
    /// session is left `Uninitialized` with no session id.
    pub async fn initialize(&mut self) -> McpResult<InitializeResult> {
        let state = self.session.state();
        if state != SessionState::Uninitialized {
            return Err(StateError::AlreadyInitialized { state }.into());
        }

        let params = InitializeParams::new(
            self.config.protocol_version.clone(),
            self.config.capabilities.clone(),
            self.config.client_info.clone(),
        );
        let request = codec::new_request(methods::INITIALIZE, serde_json::to_value(&params)?);

        info!(
            endpoint = %self.session.endpoint(),
            protocol_version = %self.config.protocol_version,
            client = %self.config.client_info.name,
            "Initializing MCP session"
        );

        let mut guard = InitGuard::enter(&mut self.session);
        self.stats.requests_sent += 1;
        self.stats.touch();

        let exchange = round_trip(
            self.transport.as_ref(),
            guard.session(),
            &request,
            self.config.init_timeout,
        )
        .await;

        let (offered, response) = match exchange {
            Ok(exchange) => exchange,
            Err(e) => {
                self.stats.errors += 1;
                warn!(error = %e, "Initialize exchange failed");
                return Err(e);
            }
        };
        self.stats.responses_received += 1;

        let parsed = into_value(response, methods::INITIALIZE).and_then(|value| {
            serde_json::from_value::<InitializeResult>(value).map_err(McpError::from)
        });
        let result = match parsed {
            Ok(result) => result,
            Err(e) => {
                self.stats.errors += 1;
                warn!(error = %e, "Server rejected initialize");
                return Err(e);
            }
        };

        if guard.session.adopt_session_id(offered) {
            info!(session_id = guard.session.session_id(), "Session established");
        } else {
            warn!("Server did not assign a session id; continuing without one");
        }
        guard.session.record_handshake(&result);

        let initialized = codec::new_notification(methods::INITIALIZED, json!({}));
        match send_notification(
            self.transport.as_ref(),
            guard.session(),
            initialized,
            self.config.request_timeout,
        )
        .await
        {
            Ok(_) => self.stats.notifications_sent += 1,
            Err(e) => {
                self.stats.errors += 1;
                warn!(
                    error = %e,
                    method = methods::INITIALIZED,
                    "Failed to deliver initialized notification; session stays usable"
                );
            }
        }

        guard.commit();

        info!(
            server = result
                .server_info
                .as_ref()
                .map(|server| server.name.as_str())
                .unwrap_or("<unnamed>"),
            protocol_version = result.protocol_version.as_deref().unwrap_or("<unspecified>"),
            "MCP session ready"
        );
        Ok(result)
    }

    /// Send a request in the `Ready` state and return its `result`.
    pub async fn request(&mut self, method: &str, params: Value) -> McpResult<Value> {
        self.require_ready(method)?;

        let request = codec::new_request(method, params);
        self.stats.requests_sent += 1;
        self.stats.touch();

        let exchange = round_trip(
            self.transport.as_ref(),
            &self.session,
            &request,
            self.config.request_timeout,
        )
        .await;

        match exchange {
            Ok((offered, response)) => {
                self.stats.responses_received += 1;
                self.adopt(offered);
                into_value(response, method).inspect_err(|_| self.stats.errors += 1)
            }
            Err(e) => {
                self.stats.errors += 1;
                debug!(method, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    /// Send a notification in the `Ready` state.
    pub async fn notify(&mut self, method: &str, params: Value) -> McpResult<()> {
        self.require_ready(method)?;

        let notification = codec::new_notification(method, params);
        self.stats.touch();

        match send_notification(
            self.transport.as_ref(),
            &self.session,
            notification,
            self.config.request_timeout,
        )
        .await
        {
            Ok(offered) => {
                self.stats.notifications_sent += 1;
                self.adopt(offered);
                Ok(())
            }
            Err(e) => {
                self.stats.errors += 1;
                Err(e)
            }
        }
    }

    /// List the server's tools.
    pub async fn list_tools(&mut self) -> McpResult<ListToolsResult> {
        let value = self.request(methods::TOOLS_LIST, json!({})).await?;
        let result: ListToolsResult = serde_json::from_value(value)?;
        debug!(count = result.tools.len(), "Listed tools");
        Ok(result)
    }

    /// Call a tool by name. Arguments are forwarded without validation.
    ///
    /// Returns the server's `result` untouched; [`CallToolResult::from_value`]
    /// gives a typed view of it.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> McpResult<Value> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.request(methods::TOOLS_CALL, serde_json::to_value(&params)?)
            .await
    }

    /// Release the transport and forget the session.
    pub async fn disconnect(&mut self) -> McpResult<()> {
        info!(endpoint = %self.session.endpoint(), "Disconnecting MCP client");
        self.session.reset();
        self.transport.disconnect().await
    }

    fn require_ready(&self, operation: &str) -> McpResult<()> {
        match self.session.state() {
            SessionState::Ready => Ok(()),
            state => Err(StateError::NotInitialized {
                operation: operation.to_string(),
                state,
            }
            .into()),
        }
    }

    fn adopt(&mut self, offered: Option<String>) {
        if self.session.adopt_session_id(offered) {
            info!(session_id = self.session.session_id(), "Server assigned a new session id");
        }
    }
}

#[async_trait]
impl ToolInvoker for McpClient {
    async fn invoke(&mut self, name: &str, arguments: Value) -> McpResult<String> {
        let raw = self.call_tool(name, arguments).await?;
        let text = CallToolResult::text_or_json(&raw);
        if CallToolResult::from_value(&raw).is_error() {
            return Err(McpError::ToolExecution {
                tool: name.to_string(),
                message: text,
            });
        }
        Ok(text)
    }
}

/// Resets the session unless the handshake it guards is committed.
struct InitGuard<'a> {
    session: &'a mut Session,
    committed: bool,
}

impl<'a> InitGuard<'a> {
    fn enter(session: &'a mut Session) -> Self {
        session.set_state(SessionState::Initializing);
        Self {
            session,
            committed: false,
        }
    }

    fn session(&self) -> &Session {
        self.session
    }

    fn commit(mut self) {
        self.session.set_state(SessionState::Ready);
        self.committed = true;
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!("Initialize did not complete, resetting session");
            self.session.reset();
        }
    }
}

/// POST a request and read its response, all under one deadline.
///
/// Returns the session id the server offered alongside the response; the
/// caller decides whether to adopt it.
async fn round_trip(
    transport: &dyn Transport,
    session: &Session,
    request: &JsonRpcRequest,
    limit: Duration,
) -> McpResult<(Option<String>, JsonRpcResponse)> {
    let message = JsonRpcMessage::Request(request.clone());
    debug!(method = request.method(), id = %request.id(), "Sending request");

    let exchange = async {
        let reply = transport.post(&message, session).await?;
        let response = reader::read_response(reply.body, request.id()).await?;
        Ok::<_, McpError>((reply.session_id, response))
    };

    match timeout(limit, exchange).await {
        Ok(result) => result,
        Err(_) => Err(McpError::timeout(request.method(), limit)),
    }
}

async fn send_notification(
    transport: &dyn Transport,
    session: &Session,
    notification: JsonRpcNotification,
    limit: Duration,
) -> McpResult<Option<String>> {
    let method = notification.method().to_string();
    let message = JsonRpcMessage::Notification(notification);
    debug!(method = %method, "Sending notification");

    let exchange = async {
        let reply = transport.post(&message, session).await?;
        reader::drain(reply.body).await?;
        Ok::<_, McpError>(reply.session_id)
    };

    match timeout(limit, exchange).await {
        Ok(result) => result,
        Err(_) => Err(McpError::timeout(method, limit)),
    }
}

fn into_value(response: JsonRpcResponse, method: &str) -> McpResult<Value> {
    response.into_result().map_err(|mut e| {
        e.method = Some(method.to_string());
        McpError::Protocol(e)
    })
}
