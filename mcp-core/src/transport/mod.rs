//! Transport layer: one HTTP POST per JSON-RPC message.
//!
//! The [`Transport`] trait is the seam between the protocol client and the
//! network. A transport serializes a message, attaches the session id it reads
//! from the [`Session`], and hands back the response headers plus the body as a
//! stream. It never writes to the session.
//!
//! Every POST holds a [`ConnectionLease`] that travels with the returned
//! [`ResponseBody`]. The lease is released when the body is dropped, whichever
//! way the exchange ends (read to completion, error, timeout or a cancelled
//! future), and [`TransportInfo::in_flight`] reports how many are still held.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mcp_stream_core::transport::{HttpStreamConfig, HttpStreamTransport, Transport};
//! use mcp_stream_core::messages::{JsonRpcRequest, RequestId};
//! use mcp_stream_core::session::Session;
//! use mcp_stream_core::reader;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpStreamConfig::from_url("https://mcp.deepwiki.com/mcp")?;
//!     let transport = HttpStreamTransport::new(config.clone())?;
//!     let session = Session::new(config.endpoint, Default::default());
//!
//!     let request = JsonRpcRequest::new("tools/list", json!({}));
//!     let id: RequestId = request.id().clone();
//!     let reply = transport.post(&request.into(), &session).await?;
//!     let response = reader::read_response(reply.body, &id).await?;
//!     println!("{:?}", response.result());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod http_stream;

pub use config::*;
pub use http_stream::HttpStreamTransport;

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream};
use reqwest::header::HeaderMap;

use crate::error::{McpResult, TransportError};
use crate::messages::JsonRpcMessage;
use crate::session::Session;

/// Core transport trait for MCP communication.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST one message and return the reply headers and body stream.
    ///
    /// A non-2xx status is a [`TransportError::HttpStatus`] carrying the
    /// fully-read response text. The session is only read, never updated; a
    /// session id offered by the server is returned in the reply for the
    /// caller to adopt.
    async fn post(&self, message: &JsonRpcMessage, session: &Session) -> McpResult<TransportReply>;

    /// Release the underlying connection. Later posts fail with
    /// [`TransportError::NotConnected`].
    async fn disconnect(&mut self) -> McpResult<()>;

    /// Check if the transport can still send.
    fn is_connected(&self) -> bool;

    /// Get transport metadata and statistics.
    fn get_info(&self) -> TransportInfo;
}

/// A successful (2xx) reply to a POST.
pub struct TransportReply {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Session id offered in the `Mcp-Session-Id` response header, if any
    pub session_id: Option<String>,
    /// The response body, still unread
    pub body: ResponseBody,
}

impl fmt::Debug for TransportReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportReply")
            .field("status", &self.status)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

type BoxedByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Incrementally readable response body.
///
/// Holds the connection lease of the POST that produced it; dropping the body
/// releases the lease.
pub struct ResponseBody {
    inner: BoxedByteStream,
    _lease: Option<ConnectionLease>,
}

impl ResponseBody {
    /// Wrap a byte stream together with the lease it keeps alive.
    pub fn new<S>(stream: S, lease: ConnectionLease) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            _lease: Some(lease),
        }
    }

    /// A body made of already-received chunks, with no lease attached.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Result<Bytes, TransportError>> =
            chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        Self {
            inner: Box::pin(stream::iter(chunks)),
            _lease: None,
        }
    }

    /// An empty body.
    pub fn empty() -> Self {
        Self::from_chunks(Vec::<Bytes>::new())
    }
}

impl Stream for ResponseBody {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

/// Shared, lock-free counters behind [`TransportInfo`].
#[derive(Debug, Default)]
pub struct TransportCounters {
    requests_sent: AtomicU64,
    notifications_sent: AtomicU64,
    errors: AtomicU64,
    in_flight: AtomicUsize,
}

impl TransportCounters {
    /// Count a sent message by kind.
    pub fn record_sent(&self, message: &JsonRpcMessage) {
        let counter = match message {
            JsonRpcMessage::Notification(_) => &self.notifications_sent,
            _ => &self.requests_sent,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed exchange.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of leases currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Fill the counter fields of `info` from the current values.
    pub fn snapshot_into(&self, info: &mut TransportInfo) {
        info.requests_sent = self.requests_sent.load(Ordering::Relaxed);
        info.notifications_sent = self.notifications_sent.load(Ordering::Relaxed);
        info.errors = self.errors.load(Ordering::Relaxed);
        info.in_flight = self.in_flight();
    }
}

/// Proof that one POST is outstanding. Released on drop.
#[derive(Debug)]
pub struct ConnectionLease {
    counters: Arc<TransportCounters>,
}

impl ConnectionLease {
    /// Take a lease against `counters`.
    pub fn acquire(counters: &Arc<TransportCounters>) -> Self {
        counters.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transport information and statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransportInfo {
    /// Type of transport
    pub transport_type: String,

    /// Whether the transport is currently connected
    pub connected: bool,

    /// When the transport was created or last connected
    pub connected_since: Option<SystemTime>,

    /// Number of requests sent
    pub requests_sent: u64,

    /// Number of notifications sent
    pub notifications_sent: u64,

    /// Number of failed exchanges
    pub errors: u64,

    /// Connection leases currently held (bodies not yet dropped)
    pub in_flight: usize,

    /// Transport-specific metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TransportInfo {
    /// Create a new transport info structure.
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: transport_type.into(),
            connected: false,
            connected_since: None,
            requests_sent: 0,
            notifications_sent: 0,
            errors: 0,
            in_flight: 0,
            metadata: HashMap::new(),
        }
    }

    /// Add transport-specific metadata.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Get the duration since connection was established.
    pub fn connection_duration(&self) -> Option<Duration> {
        self.connected_since.map(|since| {
            SystemTime::now()
                .duration_since(since)
                .unwrap_or_default()
        })
    }
}
