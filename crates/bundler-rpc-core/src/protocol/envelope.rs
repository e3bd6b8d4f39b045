//! Generic JSON-RPC 2.0 envelope (first validation stage).

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Number, Value};

use crate::error::RpcError;

/// Request identifier echoed back on every response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RequestId {
    Number(Number),
    String(String),
    #[default]
    Null,
}

impl RequestId {
    /// Accept only the shapes JSON-RPC allows for `id`.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => Some(RequestId::Number(n.clone())),
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Null => Some(RequestId::Null),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => Value::Number(n.clone()),
            RequestId::String(s) => Value::String(s.clone()),
            RequestId::Null => Value::Null,
        }
    }

    /// Best-effort id recovery from a body that failed validation.
    pub fn recover(body: &Value) -> Self {
        body.get("id")
            .and_then(RequestId::from_value)
            .unwrap_or_default()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s:?}"),
            RequestId::Null => f.write_str("null"),
        }
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        RequestId::from_value(&v)
            .ok_or_else(|| de::Error::custom("id must be a number, a string or null"))
    }
}

/// The fixed `"2.0"` protocol marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl JsonRpcVersion {
    pub const STR: &'static str = "2.0";
}

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::STR)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == Self::STR {
            Ok(JsonRpcVersion)
        } else {
            Err(de::Error::custom(format!("jsonrpc must be \"2.0\", got {s:?}")))
        }
    }
}

/// Validated JSON-RPC request, before method/params checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcRequest {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// Envelope validation failure, with whatever id could be recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeError {
    pub id: RequestId,
    pub error: RpcError,
}

impl JsonRpcRequest {
    /// Validate an already-parsed JSON value against the generic schema.
    pub fn from_value(body: Value) -> Result<Self, EnvelopeError> {
        let id = RequestId::recover(&body);
        serde_json::from_value(body).map_err(|e| EnvelopeError {
            id,
            error: RpcError::invalid_fields(format!("invalid JSON-RPC request: {e}")),
        })
    }

    /// Parse raw bytes; malformed JSON yields an error with `id = null`.
    pub fn from_slice(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let body: Value = serde_json::from_slice(raw).map_err(|e| EnvelopeError {
            id: RequestId::Null,
            error: RpcError::invalid_fields(format!("invalid JSON-RPC request: {e}")),
        })?;
        Self::from_value(body)
    }
}

/// `{jsonrpc, id, result}`
pub fn success_response(id: &RequestId, result: Value) -> Value {
    json!({
        "jsonrpc": JsonRpcVersion::STR,
        "id": id.to_value(),
        "result": result,
    })
}

/// `{jsonrpc, id, error: {message, code, data?}}`
pub fn error_response(id: &RequestId, error: &RpcError) -> Value {
    let mut err = Map::new();
    err.insert("message".into(), Value::String(error.message.clone()));
    err.insert("code".into(), Value::from(error.code.code()));
    if let Some(data) = &error.data {
        err.insert("data".into(), data.clone());
    }
    json!({
        "jsonrpc": JsonRpcVersion::STR,
        "id": id.to_value(),
        "error": Value::Object(err),
    })
}

/// `{jsonrpc, id, error: {message}}` used for unexpected failures.
pub fn bare_error_response(id: &RequestId, message: &str) -> Value {
    json!({
        "jsonrpc": JsonRpcVersion::STR,
        "id": id.to_value(),
        "error": { "message": message },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn params_default_to_empty() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": 7, "method": "eth_chainId"
        }))
        .unwrap();
        assert_eq!(req.id, RequestId::from(7));
        assert!(req.params.is_empty());
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "x"})).unwrap_err();
        assert_eq!(err.id, RequestId::Null);
        assert_eq!(err.error.code, ErrorCode::InvalidFields);
        assert!(err.error.message.contains("id"));
    }

    #[test]
    fn recovers_id_when_other_fields_are_bad() {
        let err = JsonRpcRequest::from_value(json!({"jsonrpc": "1.0", "id": "abc", "method": "x"})).unwrap_err();
        assert_eq!(err.id, RequestId::from("abc"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": 1, "method": "x", "extra": true
        }))
        .unwrap_err();
        assert_eq!(err.id, RequestId::from(1));
    }

    #[test]
    fn non_json_has_null_id() {
        let err = JsonRpcRequest::from_slice(b"not json").unwrap_err();
        assert_eq!(err.id, RequestId::Null);
        assert!(err.error.message.starts_with("invalid JSON-RPC request"));
    }

    #[test]
    fn error_response_shape() {
        let v = error_response(&RequestId::Null, &RpcError::invalid_request("nope"));
        assert_eq!(v, json!({"jsonrpc": "2.0", "id": null, "error": {"message": "nope", "code": -32601}}));
    }
}
