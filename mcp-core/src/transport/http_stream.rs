//! Streamable HTTP transport.
//!
//! - Every message is a POST to the configured endpoint, used as-is
//! - Session management via the `Mcp-Session-Id` header
//! - The response body may be plain JSON or `text/event-stream`; it is handed
//!   back unread so the caller decides how to consume it

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    AuthConfig, ConnectionLease, HttpStreamConfig, ResponseBody, Transport, TransportCounters,
    TransportInfo, TransportReply,
};
use crate::codec;
use crate::error::{McpResult, TransportError};
use crate::messages::JsonRpcMessage;
use crate::session::{Session, SESSION_ID_HEADER};

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// MCP Streamable HTTP transport backed by `reqwest`.
pub struct HttpStreamTransport {
    /// HTTP client; `None` once disconnected
    client: Option<Client>,
    config: HttpStreamConfig,
    counters: Arc<TransportCounters>,
    connected_since: Option<SystemTime>,
}

impl HttpStreamTransport {
    /// Build the HTTP client for `config`.
    pub fn new(config: HttpStreamConfig) -> McpResult<Self> {
        config.validate()?;

        if config.accept_invalid_certs {
            warn!(endpoint = %config.endpoint, "TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::InvalidConfig {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        info!(endpoint = %config.endpoint, "Created MCP Streamable HTTP transport");

        Ok(Self {
            client: Some(client),
            config,
            counters: Arc::new(TransportCounters::default()),
            connected_since: Some(SystemTime::now()),
        })
    }

    /// The endpoint every message is posted to.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    fn apply_headers(&self, mut request: RequestBuilder, session: &Session) -> RequestBuilder {
        request = request
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_BOTH);

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request = match &self.config.auth {
            Some(AuthConfig::Bearer { token }) => request.bearer_auth(token),
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(AuthConfig::Header { name, value }) => request.header(name.as_str(), value.as_str()),
            None => request,
        };

        if session.has_session_id() {
            request = request.header(SESSION_ID_HEADER, session.session_id());
        }

        request
    }
}

#[async_trait]
impl Transport for HttpStreamTransport {
    async fn post(&self, message: &JsonRpcMessage, session: &Session) -> McpResult<TransportReply> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TransportError::NotConnected {
                reason: "transport has been disconnected".to_string(),
            })?;

        let body = codec::encode(message)?;
        debug!(
            kind = message.kind(),
            method = message.method().unwrap_or_default(),
            id = ?message.id(),
            bytes = body.len(),
            has_session = session.has_session_id(),
            "POST {}",
            self.config.endpoint
        );

        let lease = ConnectionLease::acquire(&self.counters);
        let request = self
            .apply_headers(client.post(self.config.endpoint.clone()), session)
            .body(body);

        let response = request.send().await.map_err(|e| {
            self.counters.record_error();
            TransportError::from(e)
        })?;
        self.counters.record_sent(message);

        let status = response.status();
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            self.counters.record_error();
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Server rejected POST");
            return Err(TransportError::HttpStatus {
                status_code: status.as_u16(),
                body,
            }
            .into());
        }

        debug!(
            status = status.as_u16(),
            content_type = ?response.headers().get(CONTENT_TYPE),
            offered_session = ?session_id,
            "Received response headers"
        );

        let headers = response.headers().clone();
        let stream = response.bytes_stream().map_err(TransportError::from);

        Ok(TransportReply {
            status: status.as_u16(),
            headers,
            session_id,
            body: ResponseBody::new(stream, lease),
        })
    }

    async fn disconnect(&mut self) -> McpResult<()> {
        if self.client.take().is_some() {
            self.connected_since = None;
            info!(endpoint = %self.config.endpoint, "MCP Streamable HTTP transport disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn get_info(&self) -> TransportInfo {
        let mut info = TransportInfo::new("http-stream");
        info.connected = self.is_connected();
        info.connected_since = self.connected_since;
        self.counters.snapshot_into(&mut info);

        info.add_metadata("endpoint", serde_json::json!(self.config.endpoint.as_str()));
        info.add_metadata("has_auth", serde_json::json!(self.config.auth.is_some()));
        info.add_metadata(
            "accept_invalid_certs",
            serde_json::json!(self.config.accept_invalid_certs),
        );
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;
    use crate::messages::{ClientCapabilities, JsonRpcRequest};
    use serde_json::json;

    fn config() -> HttpStreamConfig {
        HttpStreamConfig::from_url("http://localhost:3001/mcp").unwrap()
    }

    #[test]
    fn test_http_stream_transport_creation() {
        let transport = HttpStreamTransport::new(config()).unwrap();
        assert!(transport.is_connected());
        assert_eq!(transport.endpoint().as_str(), "http://localhost:3001/mcp");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = config().auth(AuthConfig::bearer(""));
        assert!(HttpStreamTransport::new(bad).is_err());
    }

    #[test]
    fn test_transport_info_metadata() {
        let transport = HttpStreamTransport::new(config().auth(AuthConfig::bearer("t"))).unwrap();
        let info = transport.get_info();

        assert_eq!(info.transport_type, "http-stream");
        assert!(info.connected);
        assert_eq!(info.in_flight, 0);
        assert_eq!(info.metadata["has_auth"], json!(true));
        assert_eq!(info.metadata["endpoint"], json!("http://localhost:3001/mcp"));
    }

    #[tokio::test]
    async fn test_post_after_disconnect_fails() {
        let mut transport = HttpStreamTransport::new(config()).unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());

        let session = Session::new(config().endpoint, ClientCapabilities::default());
        let message = JsonRpcRequest::new("tools/list", json!({})).into();
        let err = transport.post(&message, &session).await.unwrap_err();
        assert!(matches!(
            err,
            McpError::Transport(TransportError::NotConnected { .. })
        ));
        assert_eq!(transport.get_info().in_flight, 0);
    }

    #[tokio::test]
    async fn test_post_sends_encoded_message_as_body() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).insert_header(SESSION_ID_HEADER, "s-1"))
            .mount(&server)
            .await;

        let http = HttpStreamConfig::from_url(format!("{}/mcp", server.uri())).unwrap();
        let transport = HttpStreamTransport::new(http.clone()).unwrap();
        let session = Session::new(http.endpoint, ClientCapabilities::default());
        let request = JsonRpcRequest::new("tools/call", json!({"name": "ask_question"}));
        let id = request.id().clone();

        let reply = transport.post(&request.into(), &session).await.unwrap();
        assert_eq!(reply.status, 202);
        assert_eq!(reply.session_id.as_deref(), Some("s-1"));
        drop(reply);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let sent: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(sent["jsonrpc"], "2.0");
        assert_eq!(sent["method"], "tools/call");
        assert_eq!(sent["params"], json!({"name": "ask_question"}));
        assert_eq!(sent["id"], serde_json::to_value(&id).unwrap());
        assert_eq!(transport.get_info().in_flight, 0);
    }
}
