//! JSON-RPC 2.0 wire codec.
//!
//! Encoding goes through serde; decoding is done by hand over a
//! [`serde_json::Value`] so every rejection maps to a specific
//! [`DecodeError`] kind instead of an opaque "data did not match any variant".

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::messages::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcVersion, RequestId,
};

/// Build a request with a fresh unique id.
pub fn new_request(method: impl Into<String>, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(method, params)
}

/// Build a notification (no id).
pub fn new_notification(method: impl Into<String>, params: Value) -> JsonRpcNotification {
    JsonRpcNotification::new(method, params)
}

/// Serialize a message to its wire bytes.
pub fn encode(message: &JsonRpcMessage) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(message)
}

/// Parse one JSON object and classify it as a request, notification or response.
///
/// # Examples
///
/// ```rust
/// use mcp_stream_core::codec;
/// use mcp_stream_core::messages::{JsonRpcMessage, RequestId};
///
/// let message = codec::decode(br#"{"jsonrpc":"2.0","id":"42","result":{"tools":[]}}"#).unwrap();
/// assert_eq!(message.id(), Some(&RequestId::from("42")));
/// assert!(matches!(message, JsonRpcMessage::Response(_)));
/// ```
pub fn decode(bytes: &[u8]) -> Result<JsonRpcMessage, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::MalformedJson {
            reason: e.to_string(),
        })?;
    decode_value(value)
}

/// Classify an already-parsed JSON value.
pub fn decode_value(value: Value) -> Result<JsonRpcMessage, DecodeError> {
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JsonRpcVersion::V2 => {}
        Some(other) => {
            return Err(DecodeError::UnsupportedVersion {
                version: other.to_string(),
            })
        }
        // Some servers omit the version on responses; requests and
        // notifications must still carry it.
        None if is_response_shaped(&object) => {}
        None => return Err(DecodeError::MissingVersion),
    }

    if let Some(method) = object.remove("method") {
        let Value::String(method) = method else {
            return Err(DecodeError::InvalidMethod);
        };
        let params = object.remove("params").unwrap_or(Value::Null);
        return match object.remove("id") {
            Some(id) => Ok(JsonRpcRequest::with_id(parse_id(id)?, method, params).into()),
            None => Ok(JsonRpcNotification::new(method, params).into()),
        };
    }

    decode_response(object).map(JsonRpcMessage::Response)
}

fn is_response_shaped(object: &Map<String, Value>) -> bool {
    !object.contains_key("method")
        && (object.contains_key("result") || object.contains_key("error"))
}

fn decode_response(mut object: Map<String, Value>) -> Result<JsonRpcResponse, DecodeError> {
    let id = match object.remove("id") {
        Some(id) => parse_id(id)?,
        None => RequestId::Null,
    };

    match (object.remove("result"), object.remove("error")) {
        (Some(_), Some(_)) => Err(DecodeError::ResultAndError { id }),
        (Some(result), None) => Ok(JsonRpcResponse::success(id, result)),
        (None, Some(error)) => {
            let error: JsonRpcError =
                serde_json::from_value(error).map_err(|e| DecodeError::InvalidErrorObject {
                    reason: e.to_string(),
                })?;
            Ok(JsonRpcResponse::error(id, error))
        }
        (None, None) => Err(DecodeError::UnrecognizedShape),
    }
}

fn parse_id(id: Value) -> Result<RequestId, DecodeError> {
    match id {
        Value::String(s) => Ok(RequestId::String(s)),
        Value::Null => Ok(RequestId::Null),
        Value::Number(n) => n
            .as_i64()
            .map(RequestId::Number)
            .ok_or_else(|| DecodeError::InvalidId { id: n.to_string() }),
        other => Err(DecodeError::InvalidId {
            id: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ResponseOutcome;
    use serde_json::json;

    #[test]
    fn test_encode_request_and_notification() {
        let request: JsonRpcMessage = JsonRpcRequest::with_id("1", "tools/list", Value::Null).into();
        let bytes = encode(&request).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "method": "tools/list", "params": {}, "id": "1"})
        );

        let notification: JsonRpcMessage =
            new_notification("notifications/initialized", json!({})).into();
        let value: Value = serde_json::from_slice(&encode(&notification).unwrap()).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_new_request_generates_distinct_ids() {
        let a = new_request("ping", json!({}));
        let b = new_request("ping", json!({}));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_decode_classifies_shapes() {
        let request = decode(br#"{"jsonrpc":"2.0","method":"ping","id":7}"#).unwrap();
        assert!(matches!(request, JsonRpcMessage::Request(_)));
        assert_eq!(request.id(), Some(&RequestId::Number(7)));

        let notification = decode(br#"{"jsonrpc":"2.0","method":"notifications/progress"}"#).unwrap();
        match notification {
            JsonRpcMessage::Notification(n) => assert_eq!(n.params(), &json!({})),
            other => panic!("expected notification, got {other:?}"),
        }

        let error = decode(
            br#"{"jsonrpc":"2.0","id":"X","error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        match error {
            JsonRpcMessage::Response(response) => match response.outcome {
                ResponseOutcome::Error(e) => assert_eq!(e.code, -32601),
                other => panic!("expected error outcome, got {other:?}"),
            },
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_response_without_id_decodes_with_null_id() {
        let message = decode(br#"{"jsonrpc":"2.0","result":{}}"#).unwrap();
        assert_eq!(message.id(), Some(&RequestId::Null));
    }

    #[test]
    fn test_response_without_version_is_accepted() {
        let message = decode(br#"{"id":"7","result":{"tools":[]}}"#).unwrap();
        assert_eq!(message.id(), Some(&RequestId::from("7")));

        let message = decode(br#"{"id":8,"error":{"code":-32601,"message":"nope"}}"#).unwrap();
        match message {
            JsonRpcMessage::Response(response) => {
                assert_eq!(response.into_result().unwrap_err().code, -32601)
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejections() {
        assert!(matches!(
            decode(b"not json"),
            Err(DecodeError::MalformedJson { .. })
        ));
        assert_eq!(decode(b"[1,2]"), Err(DecodeError::NotAnObject));
        assert_eq!(
            decode(br#"{"id":"1","method":"tools/list"}"#),
            Err(DecodeError::MissingVersion)
        );
        assert_eq!(decode(br#"{"id":"1"}"#), Err(DecodeError::MissingVersion));
        assert!(matches!(
            decode(br#"{"jsonrpc":"1.0","id":"1","result":{}}"#),
            Err(DecodeError::UnsupportedVersion { .. })
        ));
        assert_eq!(
            decode(br#"{"jsonrpc":"2.0","method":5}"#),
            Err(DecodeError::InvalidMethod)
        );
        assert!(matches!(
            decode(br#"{"jsonrpc":"2.0","id":{"a":1},"result":{}}"#),
            Err(DecodeError::InvalidId { .. })
        ));
        assert_eq!(
            decode(br#"{"jsonrpc":"2.0","id":"1","result":{},"error":{"code":1,"message":"x"}}"#),
            Err(DecodeError::ResultAndError {
                id: RequestId::from("1")
            })
        );
        assert_eq!(
            decode(br#"{"jsonrpc":"2.0","id":"1"}"#),
            Err(DecodeError::UnrecognizedShape)
        );
        assert!(matches!(
            decode(br#"{"jsonrpc":"2.0","id":"1","error":"boom"}"#),
            Err(DecodeError::InvalidErrorObject { .. })
        ));
    }

    #[test]
    fn test_encode_then_decode_response() {
        let response: JsonRpcMessage =
            JsonRpcResponse::error("abc", JsonRpcError::invalid_params("missing name")).into();
        let decoded = decode(&encode(&response).unwrap()).unwrap();
        assert_eq!(decoded, response);
    }
}
