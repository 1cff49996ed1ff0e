use std::sync::Arc;
use std::time::Duration;

use ledgerlink_frame::StreamRegistry;
use ledgerlink_transport::TransportConfig;

/// Default pause between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);
/// Default time a request may wait for its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Default depth of the unsolicited stream queue.
pub const DEFAULT_INCOMING_CAPACITY: usize = 1000;
/// Default depth of the outgoing request queue.
pub const DEFAULT_OUTGOING_CAPACITY: usize = 10;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// `ws://` or `wss://` endpoint of the node.
    pub endpoint: String,
    /// Reconnect after a connection failure instead of closing the session.
    pub reconnect: bool,
    /// Per-connection deadlines.
    pub transport: TransportConfig,
    /// Pause between reconnect attempts.
    pub reconnect_interval: Duration,
    /// Per-request reply deadline.
    pub request_timeout: Duration,
    /// Capacity of the unsolicited stream queue. The caller must drain it.
    pub incoming_capacity: usize,
    /// Capacity of the outgoing request queue.
    pub outgoing_capacity: usize,
    /// Push types routed to the stream queue.
    pub stream_registry: Arc<StreamRegistry>,
}

impl SessionConfig {
    /// Defaults for `endpoint`, with reconnection enabled.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_incoming_capacity(mut self, capacity: usize) -> Self {
        self.incoming_capacity = capacity.max(1);
        self
    }

    pub fn with_outgoing_capacity(mut self, capacity: usize) -> Self {
        self.outgoing_capacity = capacity.max(1);
        self
    }

    pub fn with_stream_registry(mut self, registry: StreamRegistry) -> Self {
        self.stream_registry = Arc::new(registry);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            reconnect: true,
            transport: TransportConfig::default(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            incoming_capacity: DEFAULT_INCOMING_CAPACITY,
            outgoing_capacity: DEFAULT_OUTGOING_CAPACITY,
            stream_registry: Arc::new(StreamRegistry::standard()),
        }
    }
}
