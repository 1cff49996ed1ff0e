//! Unsolicited stream messages and the type-name registry that decodes them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` of the ledger stream push.
pub const LEDGER_CLOSED: &str = "ledgerClosed";
/// `type` of the server stream push.
pub const SERVER_STATUS: &str = "serverStatus";
/// `type` of the transactions stream push.
pub const TRANSACTION: &str = "transaction";

/// A validated ledger closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerClosed {
    pub ledger_index: u64,
    pub ledger_hash: String,
    pub ledger_time: u64,
    pub fee_base: u64,
    #[serde(default)]
    pub fee_ref: Option<u64>,
    pub reserve_base: u64,
    pub reserve_inc: u64,
    #[serde(default)]
    pub txn_count: Option<u64>,
    #[serde(default)]
    pub validated_ledgers: Option<String>,
}

/// Server load or state changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerStatus {
    pub server_status: String,
    pub load_base: u64,
    pub load_factor: u64,
    #[serde(default)]
    pub base_fee: Option<u64>,
    #[serde(default)]
    pub load_factor_server: Option<u64>,
}

/// A transaction was applied to a ledger (or proposed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionStream {
    pub engine_result: String,
    pub engine_result_code: i64,
    #[serde(default)]
    pub engine_result_message: Option<String>,
    #[serde(default)]
    pub ledger_hash: Option<String>,
    #[serde(default)]
    pub ledger_index: Option<u64>,
    #[serde(default)]
    pub validated: bool,
    pub transaction: Value,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// A decoded unsolicited push.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    LedgerClosed(LedgerClosed),
    ServerStatus(ServerStatus),
    Transaction(Box<TransactionStream>),
    /// A type registered with [`StreamRegistry::register_raw`].
    Other { kind: String, body: Map<String, Value> },
}

impl StreamMessage {
    /// The wire `type` this message was decoded from.
    pub fn kind(&self) -> &str {
        match self {
            StreamMessage::LedgerClosed(_) => LEDGER_CLOSED,
            StreamMessage::ServerStatus(_) => SERVER_STATUS,
            StreamMessage::Transaction(_) => TRANSACTION,
            StreamMessage::Other { kind, .. } => kind,
        }
    }
}

/// Decoder from a raw frame to a typed stream message.
pub type StreamDecoder = fn(&[u8]) -> serde_json::Result<StreamMessage>;

/// Immutable table from push `type` names to decoders.
///
/// Built once, then shared (typically behind an `Arc`) by every connection
/// generation of a session.
#[derive(Clone, Default)]
pub struct StreamRegistry {
    decoders: HashMap<String, StreamDecoder>,
}

impl StreamRegistry {
    /// Create an empty registry: every push is treated as a reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ledger, server and transaction streams.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(LEDGER_CLOSED, decode_ledger_closed);
        registry.register(SERVER_STATUS, decode_server_status);
        registry.register(TRANSACTION, decode_transaction);
        registry
    }

    /// Register a decoder for a push type, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, decoder: StreamDecoder) -> &mut Self {
        let _ = self.decoders.insert(kind.into(), decoder);
        self
    }

    /// Register a push type decoded into [`StreamMessage::Other`].
    pub fn register_raw(&mut self, kind: impl Into<String>) -> &mut Self {
        self.register(kind, decode_other)
    }

    /// Check if a push type has a registered decoder.
    pub fn contains(&self, kind: &str) -> bool {
        self.decoders.contains_key(kind)
    }

    /// Registered push types, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Decode a frame with the decoder registered for `kind`.
    ///
    /// Returns `None` when `kind` is not registered.
    pub fn decode(&self, kind: &str, frame: &[u8]) -> Option<serde_json::Result<StreamMessage>> {
        self.decoders.get(kind).map(|decoder| decoder(frame))
    }
}

impl std::fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn decode_ledger_closed(frame: &[u8]) -> serde_json::Result<StreamMessage> {
    serde_json::from_slice(frame).map(StreamMessage::LedgerClosed)
}

fn decode_server_status(frame: &[u8]) -> serde_json::Result<StreamMessage> {
    serde_json::from_slice(frame).map(StreamMessage::ServerStatus)
}

fn decode_transaction(frame: &[u8]) -> serde_json::Result<StreamMessage> {
    serde_json::from_slice(frame).map(|tx| StreamMessage::Transaction(Box::new(tx)))
}

fn decode_other(frame: &[u8]) -> serde_json::Result<StreamMessage> {
    let mut body: Map<String, Value> = serde_json::from_slice(frame)?;
    let kind = match body.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => String::new(),
    };
    Ok(StreamMessage::Other { kind, body })
}
