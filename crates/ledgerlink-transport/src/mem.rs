//! In-memory transport.
//!
//! [`memory_transport`] returns a [`MemoryConnector`] (handed to a session)
//! and a [`MemoryRemote`] that plays the node: it accepts each dial as a
//! [`MemoryConnection`], reads outbound frames, replies, pushes, and can drop
//! or refuse connections. No deadlines are applied.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{Connector, FrameSink, FrameStream, OutboundFrame, Transport};

const MEMORY_ENDPOINT: &str = "memory://node";

/// Create a connected connector/remote pair.
pub fn memory_transport() -> (MemoryConnector, MemoryRemote) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        refuse: AtomicBool::new(false),
        dials: AtomicUsize::new(0),
    });
    (
        MemoryConnector {
            accept_tx,
            shared: Arc::clone(&shared),
        },
        MemoryRemote { accept_rx, shared },
    )
}

struct Shared {
    refuse: AtomicBool,
    dials: AtomicUsize,
}

/// Client side of an in-memory transport.
#[derive(Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryConnection>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Transport> {
        let _ = self.shared.dials.fetch_add(1, Ordering::SeqCst);

        if self.shared.refuse.load(Ordering::SeqCst) {
            return Err(refused("remote is refusing connections"));
        }

        let (to_remote_tx, to_remote_rx) = mpsc::unbounded_channel();
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();

        let connection = MemoryConnection {
            inbound: to_remote_rx,
            outbound: to_client_tx,
        };
        self.accept_tx
            .send(connection)
            .map_err(|_| refused("remote is gone"))?;

        debug!("memory transport connected");
        Ok(Transport::new(
            MemorySink { tx: to_remote_tx },
            MemoryStream { rx: to_client_rx },
        ))
    }

    fn endpoint(&self) -> &str {
        MEMORY_ENDPOINT
    }
}

impl std::fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnector")
            .field("endpoint", &MEMORY_ENDPOINT)
            .finish()
    }
}

fn refused(reason: &str) -> TransportError {
    TransportError::Connect {
        endpoint: MEMORY_ENDPOINT.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, reason.to_string()),
    }
}

/// Node side of an in-memory transport.
pub struct MemoryRemote {
    accept_rx: mpsc::UnboundedReceiver<MemoryConnection>,
    shared: Arc<Shared>,
}

impl MemoryRemote {
    /// Wait for the next dial. Returns `None` once every connector is dropped.
    pub async fn accept(&mut self) -> Option<MemoryConnection> {
        self.accept_rx.recv().await
    }

    /// Make subsequent dials fail with a connect error.
    pub fn set_refuse(&self, refuse: bool) {
        self.shared.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of dials attempted so far, refused ones included.
    pub fn dials(&self) -> usize {
        self.shared.dials.load(Ordering::SeqCst)
    }
}

/// One accepted in-memory connection, seen from the node.
///
/// Dropping it closes the connection: the client's receive returns
/// [`TransportError::Closed`] and its sends start failing.
pub struct MemoryConnection {
    inbound: mpsc::UnboundedReceiver<OutboundFrame>,
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl MemoryConnection {
    /// Next frame the client sent, pings and closes included.
    pub async fn recv_frame(&mut self) -> Option<OutboundFrame> {
        self.inbound.recv().await
    }

    /// Next text frame the client sent, skipping keepalive pings.
    ///
    /// Returns `None` when the client sent a close frame or went away.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.inbound.recv().await? {
                OutboundFrame::Text(text) => return Some(text),
                OutboundFrame::Ping => continue,
                OutboundFrame::Close => return None,
            }
        }
    }

    /// Send a data frame to the client. Returns false if the client is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.outbound.send(Bytes::from(text.into())).is_ok()
    }
}

struct MemorySink {
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: OutboundFrame) -> Result<()> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

struct MemoryStream {
    rx: mpsc::UnboundedReceiver<Bytes>,
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn receive(&mut self) -> Result<Bytes> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}
