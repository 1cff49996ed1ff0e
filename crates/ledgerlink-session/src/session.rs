//! Session lifecycle: the initial dial, the per-session supervisor task, and
//! reconnection.

use std::sync::Arc;

use ledgerlink_frame::StreamMessage;
use ledgerlink_transport::{Connector, Transport, WebSocketConnector};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::arbiter::{Arbiter, Exit};
use crate::client::Client;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::request::Request;

/// A multiplexed connection to a ledger node.
///
/// Requests go through [`client`](Session::client); unsolicited stream
/// messages arrive through [`recv`](Session::recv) and must be drained, or
/// the session stalls once the stream queue is full.
pub struct Session {
    endpoint: String,
    client: Client,
    incoming: mpsc::Receiver<StreamMessage>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    supervisor: Option<JoinHandle<()>>,
}

impl Session {
    /// Dial `endpoint` with default settings.
    ///
    /// A failed dial is returned as [`SessionError::Connect`]; `open` never
    /// retries.
    pub async fn open(endpoint: &str, reconnect: bool) -> Result<Self> {
        Self::open_with_config(SessionConfig::new(endpoint).with_reconnect(reconnect)).await
    }

    /// Dial the WebSocket endpoint named in `config`.
    pub async fn open_with_config(config: SessionConfig) -> Result<Self> {
        let connector = WebSocketConnector::new(&config.endpoint, config.transport)?;
        Self::open_with_connector(Arc::new(connector), config).await
    }

    /// Open a session over any [`Connector`]. `config.endpoint` is ignored in
    /// favor of the connector's own.
    pub async fn open_with_connector(
        connector: Arc<dyn Connector>,
        config: SessionConfig,
    ) -> Result<Self> {
        let endpoint = connector.endpoint().to_string();
        let transport = match connector.connect().await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "connect failed");
                return Err(SessionError::Connect(err));
            }
        };
        info!(endpoint = %endpoint, "session opened");

        let (outgoing_tx, outgoing_rx) = mpsc::channel(config.outgoing_capacity);
        let (incoming_tx, incoming_rx) = mpsc::channel(config.incoming_capacity);
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();

        let supervisor = Supervisor {
            connector,
            config,
            outgoing: outgoing_rx,
            incoming: incoming_tx,
            shutdown: shutdown.clone(),
            tracker: tracker.clone(),
        };
        let span = info_span!("session", endpoint = %endpoint);
        let handle = tokio::spawn(supervisor.run(transport).instrument(span));

        Ok(Self {
            endpoint,
            client: Client::new(outgoing_tx, shutdown.clone(), tracker.clone()),
            incoming: incoming_rx,
            shutdown,
            tracker,
            supervisor: Some(handle),
        })
    }

    /// Endpoint this session dials.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request handle. Clone it to submit from other tasks.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Next unsolicited stream message.
    ///
    /// Returns `None` once the session has shut down (closed, or lost its
    /// connection with reconnection disabled).
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.incoming.recv().await
    }

    /// Number of live background tasks: pumps, request timers and
    /// pagination helpers. The supervisor itself is not counted.
    pub fn live_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Shut the session down.
    ///
    /// Pending requests fail with [`SessionError::Disconnected`], queued ones
    /// with [`SessionError::Closed`]. Stream messages still buffered are
    /// discarded. Returns once every background task has exited.
    pub async fn close(mut self) {
        debug!(endpoint = %self.endpoint, "closing session");
        self.shutdown.cancel();

        while self.incoming.recv().await.is_some() {}

        if let Some(supervisor) = self.supervisor.take() {
            if let Err(err) = supervisor.await {
                warn!(error = %err, "session supervisor panicked");
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!(endpoint = %self.endpoint, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("live_tasks", &self.live_tasks())
            .finish()
    }
}

/// Long-lived task owning the session's queues across generations.
struct Supervisor {
    connector: Arc<dyn Connector>,
    config: SessionConfig,
    outgoing: mpsc::Receiver<Box<dyn Request>>,
    incoming: mpsc::Sender<StreamMessage>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Supervisor {
    async fn run(mut self, first: Transport) {
        let mut transport = first;
        let mut generation = 0;

        loop {
            generation += 1;
            let mut arbiter = Arbiter::start(generation, transport, &self.config, &self.tracker);
            let exit = arbiter
                .run(&mut self.outgoing, &self.incoming, &self.shutdown)
                .await;
            debug!(generation, ?exit, "arbitration loop stopped");
            arbiter.teardown().await;

            if exit == Exit::Shutdown || self.shutdown.is_cancelled() || !self.config.reconnect {
                break;
            }
            match self.reconnect().await {
                Some(next) => transport = next,
                None => break,
            }
        }

        self.close_outgoing();
        debug!("supervisor stopped");
    }

    /// Dial on a fixed interval until a connection is made or the session
    /// closes. Requests submitted meanwhile are failed right away.
    async fn reconnect(&mut self) -> Option<Transport> {
        let interval = self.config.reconnect_interval;
        let endpoint = self.connector.endpoint().to_string();
        info!(endpoint = %endpoint, ?interval, "connection lost, reconnecting");

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                request = self.outgoing.recv() => {
                    let request = request?;
                    debug!(id = request.id(), "failing request submitted while disconnected");
                    request.fail(SessionError::disconnected());
                }
                _ = ticker.tick() => {
                    info!(endpoint = %endpoint, "reconnect attempt");
                    let dialed = tokio::select! {
                        _ = self.shutdown.cancelled() => return None,
                        dialed = self.connector.connect() => dialed,
                    };
                    match dialed {
                        Ok(transport) => {
                            info!(endpoint = %endpoint, "reconnected");
                            return Some(transport);
                        }
                        Err(err) => warn!(endpoint = %endpoint, error = %err, "reconnect failed"),
                    }
                }
            }
        }
    }

    /// Refuse further submissions and fail whatever is still queued.
    fn close_outgoing(&mut self) {
        self.outgoing.close();
        while let Ok(request) = self.outgoing.try_recv() {
            request.fail(SessionError::Closed);
        }
    }
}
