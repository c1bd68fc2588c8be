//! Streaming response reader.
//!
//! A Streamable HTTP server may answer a POST with a single JSON object or
//! with an event stream of `data: {...}` lines, possibly interleaving
//! notifications before the response. The reader accumulates the whole body,
//! then picks the one response that answers the outstanding request:
//!
//! 1. every non-empty line (with any `data:` prefix stripped) is decoded,
//!    lines that fail to decode are skipped;
//! 2. a response whose id equals the request id wins immediately;
//! 3. otherwise the last response seen is used;
//! 4. if no line produced a response, the whole body is decoded as one value;
//! 5. if that fails too, a [`ParseError`] carries the raw text.

use std::fmt::Display;
use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::codec;
use crate::error::{McpResult, ParseError, TransportError};
use crate::messages::{JsonRpcMessage, JsonRpcResponse, RequestId};

const DATA_PREFIX: &str = "data:";

/// Read a body stream to the end and select the response for `id`.
pub async fn read_response<S, E>(stream: S, id: &RequestId) -> McpResult<JsonRpcResponse>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let text = read_to_text(stream).await?;
    Ok(select_response(&text, id)?)
}

/// Consume a body stream without interpreting it, returning the byte count.
pub async fn drain<S, E>(stream: S) -> Result<usize, TransportError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut stream = pin!(stream);
    let mut total = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::BodyReadFailed {
            reason: e.to_string(),
        })?;
        total += chunk.len();
    }
    trace!(bytes = total, "Drained response body");
    Ok(total)
}

/// Accumulate every chunk and convert to text once the stream ends.
///
/// Conversion is lossy, so a multi-byte character split across two chunks
/// survives and invalid UTF-8 never aborts the read.
pub async fn read_to_text<S, E>(stream: S) -> Result<String, TransportError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut stream = pin!(stream);
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::BodyReadFailed {
            reason: e.to_string(),
        })?;
        buffer.extend_from_slice(&chunk);
    }
    debug!(bytes = buffer.len(), "Read response body");
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Pick the response answering `id` out of an accumulated body.
///
/// # Examples
///
/// ```rust
/// use mcp_stream_core::messages::RequestId;
/// use mcp_stream_core::reader::select_response;
///
/// let body = "data: {\"jsonrpc\":\"2.0\",\"id\":\"42\",\"result\":{\"tools\":[]}}\n";
/// let response = select_response(body, &RequestId::from("42")).unwrap();
/// assert_eq!(response.result().unwrap()["tools"], serde_json::json!([]));
/// ```
pub fn select_response(text: &str, id: &RequestId) -> Result<JsonRpcResponse, ParseError> {
    let mut fallback = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let candidate = strip_data_prefix(line);
        match codec::decode(candidate.as_bytes()) {
            Ok(JsonRpcMessage::Response(response)) => {
                if &response.id == id {
                    return Ok(response);
                }
                fallback = Some(response);
            }
            Ok(other) => trace!(kind = other.kind(), "Skipping non-response stream line"),
            Err(e) => trace!(error = %e, line = candidate, "Ignoring undecodable stream line"),
        }
    }

    if let Some(response) = fallback {
        debug!(
            expected = %id,
            got = %response.id,
            "No response with matching id, using last response in stream"
        );
        return Ok(response);
    }

    match codec::decode(text.trim().as_bytes()) {
        Ok(JsonRpcMessage::Response(response)) => Ok(response),
        Ok(other) => Err(ParseError::new(
            format!("stream carried a {} but no response", other.kind()),
            text,
        )),
        Err(e) => Err(ParseError::new(
            format!("no JSON-RPC response in stream: {e}"),
            text,
        )),
    }
}

fn strip_data_prefix(line: &str) -> &str {
    match line.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}
