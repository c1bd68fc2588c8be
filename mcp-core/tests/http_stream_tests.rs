//! End-to-end tests of the client against a mock Streamable HTTP server.
//!
//! The mock answers like a real MCP server: it echoes each request's id,
//! assigns a session id on every response, acknowledges notifications with
//! 202 and can reply either as `text/event-stream` or as plain JSON.

use std::time::Duration;

use mcp_stream_core::error::TransportError;
use mcp_stream_core::transport::AuthConfig;
use mcp_stream_core::{
    ClientConfig, HttpStreamConfig, McpClient, McpError, SessionState, ToolInvoker,
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SESSION: &str = "sess-abc";

struct McpServerMock {
    session_id: &'static str,
    sse: bool,
    delay: Option<Duration>,
}

impl McpServerMock {
    fn sse() -> Self {
        Self {
            session_id: SESSION,
            sse: true,
            delay: None,
        }
    }

    fn json() -> Self {
        Self {
            sse: false,
            ..Self::sse()
        }
    }

    fn payload(id: Value, body: &Value) -> Value {
        match body["method"].as_str().unwrap_or_default() {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "DeepWiki", "version": "0.0.1"}
                }
            }),
            "tools/list" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"tools": [
                    {
                        "name": "read_wiki_structure",
                        "description": "Get a list of documentation topics",
                        "inputSchema": {"type": "object"}
                    },
                    {
                        "name": "ask_question",
                        "description": "Ask any question about a GitHub repository",
                        "input_schema": {"type": "object", "required": ["repoName", "question"]}
                    }
                ]}
            }),
            "tools/call" => {
                let arguments = &body["params"]["arguments"];
                let text = format!(
                    "{} asked about {}",
                    arguments["question"].as_str().unwrap_or("?"),
                    arguments["repoName"].as_str().unwrap_or("?")
                );
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {"content": [{"type": "text", "text": text}]}
                })
            }
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": "Method not found"}
            }),
        }
    }
}

impl Respond for McpServerMock {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let Some(id) = body.get("id").cloned() else {
            return ResponseTemplate::new(202);
        };

        let payload = Self::payload(id, &body);
        let template = if self.sse {
            // A progress notification first, so the reader has to pick the response.
            let stream = format!(
                "event: message\ndata: {}\n\nevent: message\ndata: {}\n\n",
                json!({"jsonrpc": "2.0", "method": "notifications/progress", "params": {"progress": 1}}),
                payload
            );
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/event-stream")
                .set_body_string(stream)
        } else {
            ResponseTemplate::new(200).set_body_json(payload)
        };

        let template = template.insert_header("Mcp-Session-Id", self.session_id);
        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

fn client_for(server: &MockServer, http: impl FnOnce(HttpStreamConfig) -> HttpStreamConfig) -> McpClient {
    let endpoint = HttpStreamConfig::from_url(format!("{}/mcp", server.uri())).unwrap();
    let config = ClientConfig::default()
        .client_info("claude-deepwiki-integration", "1.0.0")
        .request_timeout(Duration::from_millis(500));
    McpClient::connect_http(http(endpoint), config).unwrap()
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn test_handshake_and_session_reuse_over_event_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(McpServerMock::sse())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    let init = client.initialize().await.unwrap();
    assert_eq!(init.server_info.unwrap().name, "DeepWiki");
    assert_eq!(client.state(), SessionState::Ready);
    assert_eq!(client.session().session_id(), SESSION);

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.names(), vec!["read_wiki_structure", "ask_question"]);
    assert!(tools.find("ask_question").unwrap().input_schema.is_some());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    let initialize: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(initialize["method"], "initialize");
    assert_eq!(initialize["params"]["protocolVersion"], "2024-11-05");
    assert_eq!(initialize["params"]["clientInfo"]["name"], "claude-deepwiki-integration");
    assert_eq!(
        initialize["params"]["capabilities"],
        json!({"roots": {"listChanged": true}, "sampling": {}})
    );
    assert_eq!(header(&requests[0], "content-type"), Some("application/json"));
    assert_eq!(
        header(&requests[0], "accept"),
        Some("application/json, text/event-stream")
    );
    assert_eq!(header(&requests[0], "mcp-session-id"), None);

    let initialized: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(initialized["method"], "notifications/initialized");
    assert!(initialized.get("id").is_none());
    assert_eq!(header(&requests[1], "mcp-session-id"), Some(SESSION));

    let list: Value = serde_json::from_slice(&requests[2].body).unwrap();
    assert_eq!(list["params"], json!({}));
    assert_eq!(header(&requests[2], "mcp-session-id"), Some(SESSION));

    assert_eq!(client.transport_info().in_flight, 0);
    assert_ok!(client.disconnect().await);
}

#[tokio::test]
async fn test_plain_json_responses_and_tool_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(McpServerMock::json())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    client.initialize().await.unwrap();

    let answer = client
        .invoke(
            "ask_question",
            json!({"repoName": "openai/codex", "question": "What is Codex?"}),
        )
        .await
        .unwrap();
    assert_eq!(answer, "What is Codex? asked about openai/codex");

    let requests = server.received_requests().await.unwrap();
    let call: Value = serde_json::from_slice(&requests[2].body).unwrap();
    assert_eq!(call["method"], "tools/call");
    assert_eq!(call["params"]["name"], "ask_question");
    assert_eq!(call["params"]["arguments"]["repoName"], "openai/codex");
}

#[tokio::test]
async fn test_server_error_object_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(McpServerMock::sse())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    client.initialize().await.unwrap();

    let err = client.request("resources/list", json!({})).await.unwrap_err();
    match err {
        McpError::Protocol(e) => {
            assert_eq!(e.code, -32601);
            assert_eq!(e.message, "Method not found");
            assert_eq!(e.method.as_deref(), Some("resources/list"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(client.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_non_success_status_is_transport_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    let err = client.initialize().await.unwrap_err();
    match err {
        McpError::Transport(TransportError::HttpStatus { status_code, body }) => {
            assert_eq!(status_code, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
    assert_eq!(client.state(), SessionState::Uninitialized);
    assert!(!client.session().has_session_id());
    assert_eq!(client.transport_info().in_flight, 0);
}

#[tokio::test]
async fn test_unparseable_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/event-stream")
                .set_body_string(": keep-alive\n\nevent: ping\n\n"),
        )
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    let err = client.initialize().await.unwrap_err();
    match err {
        McpError::Parse(e) => assert!(e.raw.contains("event: ping")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_leaves_session_untouched_and_releases_connection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(McpServerMock {
            session_id: "sess-late",
            sse: true,
            delay: Some(Duration::from_secs(3)),
        })
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(McpServerMock::sse())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    client.initialize().await.unwrap();

    let err = client.list_tools().await.unwrap_err();
    match err {
        McpError::Transport(TransportError::Timeout { operation, .. }) => {
            assert_eq!(operation, "tools/list");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(client.state(), SessionState::Ready);
    assert_eq!(client.session().session_id(), SESSION);
    assert_eq!(client.transport_info().in_flight, 0);
}

#[tokio::test]
async fn test_configured_headers_and_auth_on_every_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(McpServerMock::json())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| {
        http.header("X-Client", "integration-tests")
            .auth(AuthConfig::bearer("secret-token"))
    });
    client.initialize().await.unwrap();
    client.list_tools().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(header(request, "authorization"), Some("Bearer secret-token"));
        assert_eq!(header(request, "x-client"), Some("integration-tests"));
    }
}

#[tokio::test]
async fn test_disconnect_releases_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(McpServerMock::sse())
        .mount(&server)
        .await;

    let mut client = client_for(&server, |http| http);
    client.initialize().await.unwrap();
    client.disconnect().await.unwrap();

    assert_eq!(client.state(), SessionState::Uninitialized);
    assert!(!client.transport_info().connected);

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        McpError::Transport(TransportError::NotConnected { .. })
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
