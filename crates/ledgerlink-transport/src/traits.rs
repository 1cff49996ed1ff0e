use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A unit handed to the transport for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A JSON envelope carried as a text frame.
    Text(String),
    /// Protocol-level keepalive ping.
    Ping,
    /// Protocol-level close.
    Close,
}

/// Sending half of a connection.
///
/// Each send is bounded by the transport's write deadline.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one frame.
    async fn send(&mut self, frame: OutboundFrame) -> Result<()>;

    /// Best-effort close. Errors are swallowed; the connection is going away
    /// either way.
    async fn close(&mut self) {
        let _ = self.send(OutboundFrame::Close).await;
    }
}

/// Receiving half of a connection.
///
/// Control frames (pong, ping) are consumed internally; only data frames are
/// returned. The read deadline is refreshed by every frame, control frames
/// included.
#[async_trait]
pub trait FrameStream: Send {
    /// Receive the next data frame.
    ///
    /// Returns `Err(TransportError::Closed)` once the peer has closed.
    async fn receive(&mut self) -> Result<Bytes>;
}

/// One established connection, split into independently owned halves.
pub struct Transport {
    sink: Box<dyn FrameSink>,
    stream: Box<dyn FrameStream>,
}

impl Transport {
    /// Assemble a transport from its halves.
    pub fn new(sink: impl FrameSink + 'static, stream: impl FrameStream + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            stream: Box::new(stream),
        }
    }

    /// Split into the sending and receiving halves.
    pub fn split(self) -> (Box<dyn FrameSink>, Box<dyn FrameStream>) {
        (self.sink, self.stream)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Dials new connections to a fixed endpoint.
///
/// A session holds one connector for its whole life and calls [`connect`]
/// once per connection generation.
///
/// [`connect`]: Connector::connect
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial a fresh connection, bounded by the connect timeout.
    async fn connect(&self) -> Result<Transport>;

    /// Endpoint this connector dials, for diagnostics.
    fn endpoint(&self) -> &str;
}
