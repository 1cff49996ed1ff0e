//! JSON envelope codec and stream message routing for ledger sessions.
//!
//! Every frame on the wire is one JSON envelope:
//! - Outbound requests carry `{id, command, ...params}`
//! - Correlated replies carry `{id, status, result | error fields}`
//! - Unsolicited pushes carry `{type, ...fields}` and no `id`
//!
//! Routing between the last two is decided by the [`StreamRegistry`]: a
//! `type` with a registered decoder is a stream message, anything else is
//! correlated by `id`.

pub mod envelope;
pub mod error;
pub mod stream;

pub use envelope::{
    decode_header, decode_reply, dump, Header, OutboundEnvelope, RemoteError, Reply, Route,
};
pub use error::{FrameError, Result};
pub use stream::{
    LedgerClosed, ServerStatus, StreamDecoder, StreamMessage, StreamRegistry, TransactionStream,
    LEDGER_CLOSED, SERVER_STATUS, TRANSACTION,
};
