//! Frame transport for ledger node sessions.
//!
//! Provides a unified interface over the physical connection to a node:
//! - WebSocket (text frames carrying JSON, ping/pong keepalive)
//! - In-memory pairs (tests and embedding)
//!
//! This is the lowest layer of ledgerlink. Everything else builds on top of
//! the [`Connector`], [`FrameSink`] and [`FrameStream`] contracts provided here.

pub mod config;
pub mod error;
pub mod mem;
pub mod traits;
pub mod ws;

pub use config::TransportConfig;
pub use error::{Result, TransportError};
pub use mem::{memory_transport, MemoryConnection, MemoryConnector, MemoryRemote};
pub use traits::{Connector, FrameSink, FrameStream, OutboundFrame, Transport};
pub use ws::WebSocketConnector;
