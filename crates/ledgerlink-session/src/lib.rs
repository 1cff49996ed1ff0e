//! Multiplexed request/stream sessions to a ledger node.
//!
//! A [`Session`] owns one connection at a time. Requests from any number of
//! tasks are correlated with their replies by id; unsolicited stream
//! messages are routed to a separate queue. When the connection fails, every
//! in-flight request is failed and the session reconnects on a fixed interval
//! (unless reconnection is disabled).

mod arbiter;
mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod paginate;
mod pump;
pub mod request;
pub mod session;
pub mod types;

pub use client::Client;
pub use config::{
    SessionConfig, DEFAULT_INCOMING_CAPACITY, DEFAULT_OUTGOING_CAPACITY,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
};
pub use error::{Result, SessionError, SERVER_DISCONNECTED};
pub use paginate::{collect_pages, stream_pages, Cursor, Marker, Page, PageStream};
pub use request::{next_id, Command, Pending, Request};
pub use session::Session;
pub use types::{
    AccountInfoResult, AccountOffer, AccountRoot, AccountTransaction, BookOffersResult, FeeDrops,
    FeeResult, LedgerDataPage, LedgerHeaderResult, LedgerResult, LedgerSpec, OrderBook,
    PathFindResult, StateEntry, Streams, SubmitResult, SubscribeResult, TrustLine, TxResult,
};
