use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FrameError, Result};
use crate::stream::StreamRegistry;

/// Outbound request envelope.
///
/// Wire shape:
/// ```text
/// {"id": 7, "command": "account_info", "account": "r...", ...}
/// ```
/// Params are flattened next to `id` and `command`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutboundEnvelope {
    /// Correlation id echoed back by the node.
    pub id: u64,
    /// Command name.
    pub command: String,
    /// Command-specific fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl OutboundEnvelope {
    /// Create an envelope from already-materialized params.
    pub fn new(id: u64, command: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            id,
            command: command.into(),
            params,
        }
    }

    /// Materialize typed params into an envelope.
    ///
    /// Params must serialize to a JSON object (or `null`, for commands without
    /// fields). Keys named `id` or `command` are dropped so they cannot shadow
    /// the envelope's own fields.
    pub fn from_params<P: Serialize + ?Sized>(
        id: u64,
        command: impl Into<String>,
        params: &P,
    ) -> Result<Self> {
        let mut params = match serde_json::to_value(params)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(FrameError::ParamsNotObject(json_kind(&other))),
        };
        let _ = params.remove("id");
        let _ = params.remove("command");
        Ok(Self::new(id, command, params))
    }

    /// Serialize to the text frame sent on the wire.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(FrameError::from)
    }
}

/// Envelope-level fields of an inbound frame, enough to route it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Correlation id, present on replies.
    #[serde(default)]
    pub id: Option<u64>,
    /// Type discriminant, present on pushes (and on replies as `"response"`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Reply status (`success` / `error`).
    #[serde(default)]
    pub status: Option<String>,
}

/// Where an inbound frame goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Unsolicited stream message with a registered decoder.
    Stream(String),
    /// Reply to be correlated against pending requests.
    Reply(u64),
    /// Neither a registered stream type nor a correlation id.
    Unroutable,
}

impl Header {
    /// Decide the route for this frame.
    ///
    /// A registered stream type always wins over an `id`, so a push is never
    /// matched against pending requests.
    pub fn route(&self, registry: &StreamRegistry) -> Route {
        if let Some(kind) = self.kind.as_deref() {
            if registry.contains(kind) {
                return Route::Stream(kind.to_string());
            }
        }
        match self.id {
            Some(id) => Route::Reply(id),
            None => Route::Unroutable,
        }
    }
}

/// Peek the routing header of an inbound frame.
pub fn decode_header(frame: &[u8]) -> Result<Header> {
    serde_json::from_slice(frame).map_err(FrameError::from)
}

/// Error reply from the node (`status: "error"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Short error token, e.g. `actNotFound`.
    pub error: String,
    /// Numeric error code, when provided.
    pub code: Option<i64>,
    /// Human-readable message, when provided.
    pub message: Option<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(code) = self.code {
            write!(f, " ({code})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Decoded reply outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<R> {
    /// `status: "success"` with a decoded `result` body.
    Success(R),
    /// `status: "error"`.
    Error(RemoteError),
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Decode a correlated reply into its typed result.
///
/// Error fields are accepted both at the top level and nested inside
/// `result`, which older nodes use.
pub fn decode_reply<R: DeserializeOwned>(frame: &[u8]) -> Result<Reply<R>> {
    let raw: RawReply = serde_json::from_slice(frame)?;

    let nested_error = raw
        .result
        .as_ref()
        .and_then(|result| result.get("error"))
        .and_then(Value::as_str)
        .is_some();

    if raw.status.as_deref() == Some("error") || raw.error.is_some() || nested_error {
        return Ok(Reply::Error(remote_error(raw)));
    }

    let result = raw.result.unwrap_or(Value::Null);
    Ok(Reply::Success(serde_json::from_value(result)?))
}

fn remote_error(raw: RawReply) -> RemoteError {
    let nested = raw.result.unwrap_or(Value::Null);
    let nested_str = |key: &str| nested.get(key).and_then(Value::as_str).map(str::to_string);

    RemoteError {
        error: raw
            .error
            .or_else(|| nested_str("error"))
            .unwrap_or_else(|| "unknown".to_string()),
        code: raw
            .error_code
            .or_else(|| nested.get("error_code").and_then(Value::as_i64)),
        message: raw.error_message.or_else(|| nested_str("error_message")),
    }
}

/// Pretty-print a frame for trace logging. Non-JSON frames are shown lossily.
pub fn dump(frame: &[u8]) -> String {
    serde_json::from_slice::<Value>(frame)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(frame).into_owned())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Fee {
        current_ledger_size: String,
    }

    #[test]
    fn envelope_flattens_params() {
        let envelope = OutboundEnvelope::from_params(
            7,
            "account_info",
            &json!({ "account": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh", "strict": true }),
        )
        .unwrap();
        let wire: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();

        assert_eq!(
            wire,
            json!({
                "id": 7,
                "command": "account_info",
                "account": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
                "strict": true,
            })
        );
    }

    #[test]
    fn envelope_accepts_unit_params() {
        let envelope = OutboundEnvelope::from_params(1, "fee", &()).unwrap();
        assert!(envelope.params.is_empty());
        assert_eq!(envelope.encode().unwrap(), r#"{"id":1,"command":"fee"}"#);
    }

    #[test]
    fn envelope_rejects_non_object_params() {
        let err = OutboundEnvelope::from_params(1, "fee", &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::ParamsNotObject("array")));
    }

    #[test]
    fn envelope_params_cannot_shadow_id() {
        let envelope =
            OutboundEnvelope::from_params(3, "tx", &json!({ "id": 99, "command": "x" })).unwrap();
        let wire: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();
        assert_eq!(wire, json!({ "id": 3, "command": "tx" }));
    }

    #[test]
    fn registered_type_routes_to_stream_even_with_id() {
        let registry = StreamRegistry::standard();
        let header = decode_header(br#"{"type":"ledgerClosed","id":4}"#).unwrap();
        assert_eq!(
            header.route(&registry),
            Route::Stream("ledgerClosed".to_string())
        );
    }

    #[test]
    fn response_type_routes_by_id() {
        let registry = StreamRegistry::standard();
        let header =
            decode_header(br#"{"id":12,"status":"success","type":"response","result":{}}"#)
                .unwrap();
        assert_eq!(header.route(&registry), Route::Reply(12));
        assert_eq!(header.status.as_deref(), Some("success"));
    }

    #[test]
    fn unknown_push_without_id_is_unroutable() {
        let registry = StreamRegistry::standard();
        let header = decode_header(br#"{"type":"peerStatusChange"}"#).unwrap();
        assert_eq!(header.route(&registry), Route::Unroutable);
    }

    #[test]
    fn malformed_header_is_an_error() {
        assert!(decode_header(b"not json").is_err());
        assert!(decode_header(br#"{"id":"seven"}"#).is_err());
    }

    #[test]
    fn decodes_success_reply() {
        let reply: Reply<Fee> = decode_reply(
            br#"{"id":1,"status":"success","type":"response","result":{"current_ledger_size":"14"}}"#,
        )
        .unwrap();
        assert_eq!(
            reply,
            Reply::Success(Fee {
                current_ledger_size: "14".to_string()
            })
        );
    }

    #[test]
    fn decodes_top_level_error_reply() {
        let reply: Reply<Fee> = decode_reply(
            br#"{"id":2,"status":"error","type":"response","error":"actNotFound","error_code":19,"error_message":"Account not found."}"#,
        )
        .unwrap();
        let Reply::Error(err) = reply else {
            panic!("expected error reply");
        };
        assert_eq!(err.error, "actNotFound");
        assert_eq!(err.code, Some(19));
        assert_eq!(err.to_string(), "actNotFound (19): Account not found.");
    }

    #[test]
    fn decodes_nested_error_reply() {
        let reply: Reply<Fee> = decode_reply(
            br#"{"id":2,"type":"response","result":{"error":"txnNotFound","error_message":"Transaction not found.","status":"error"}}"#,
        )
        .unwrap();
        assert_eq!(
            reply,
            Reply::Error(RemoteError {
                error: "txnNotFound".to_string(),
                code: None,
                message: Some("Transaction not found.".to_string()),
            })
        );
    }

    #[test]
    fn mismatched_result_body_is_a_decode_error() {
        let result: Result<Reply<Fee>> =
            decode_reply(br#"{"id":1,"status":"success","result":{"current_ledger_size":14}}"#);
        assert!(matches!(result, Err(FrameError::Json(_))));
    }

    #[test]
    fn dump_pretty_prints_json_and_passes_through_other_bytes() {
        assert!(dump(br#"{"id":1}"#).contains("\"id\": 1"));
        assert_eq!(dump(b"raw"), "raw");
    }
}
