//! Self-reconnecting WebSocket sessions to ledger nodes.
//!
//! One connection carries many concurrent requests, correlated with their
//! replies by id, alongside unsolicited stream messages (closed ledgers,
//! transactions, server status).
//!
//! # Crate Structure
//!
//! - [`transport`]: connection contract, WebSocket and in-memory transports
//! - [`frame`]: JSON envelopes, reply decoding and the stream registry
//! - [`session`]: sessions, pumps, reconnection and the command catalog
//!   (behind the `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use ledgerlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ledgerlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use ledgerlink_session::*;
}
