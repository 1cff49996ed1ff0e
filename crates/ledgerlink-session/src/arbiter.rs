//! The arbitration loop of one connection generation.
//!
//! The loop is the only owner of the pending table and the per-request
//! cancellation tokens; everything else talks to it through channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ledgerlink_frame::{decode_header, dump, OutboundEnvelope, Route, StreamMessage, StreamRegistry};
use ledgerlink_transport::Transport;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, trace, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::pump::{read_pump, write_pump};
use crate::request::Request;

/// Frames buffered between the read pump and the loop.
const INBOUND_CAPACITY: usize = 64;

/// Why a generation's loop stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// The read pump stopped: the node closed or the read deadline passed.
    Disconnected,
    /// A request went unanswered past its deadline.
    Timeout,
    /// The write pump stopped while a request was being handed to it.
    WriteFailed,
    /// The session is closing.
    Shutdown,
}

/// Per-generation state: the pump handoffs and the pending tables.
pub(crate) struct Arbiter {
    generation: u64,
    registry: Arc<StreamRegistry>,
    request_timeout: Duration,
    tracker: TaskTracker,
    outbound: Option<mpsc::Sender<OutboundEnvelope>>,
    inbound: mpsc::Receiver<Bytes>,
    closed: CancellationToken,
    expired_tx: mpsc::UnboundedSender<u64>,
    expired_rx: mpsc::UnboundedReceiver<u64>,
    pending: HashMap<u64, Box<dyn Request>>,
    timers: HashMap<u64, CancellationToken>,
}

impl Arbiter {
    /// Split `transport` and spawn its pumps on `tracker`.
    pub(crate) fn start(
        generation: u64,
        transport: Transport,
        config: &SessionConfig,
        tracker: &TaskTracker,
    ) -> Self {
        let (sink, stream) = transport.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(1);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let closed = CancellationToken::new();

        let ping_interval = config.transport.ping_interval();
        let write_closed = closed.clone();
        tracker.spawn(async move {
            write_pump(sink, outbound_rx, ping_interval).await;
            write_closed.cancel();
        });
        tracker.spawn(read_pump(stream, inbound_tx, closed.clone()));

        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        debug!(generation, "connection generation started");

        Self {
            generation,
            registry: Arc::clone(&config.stream_registry),
            request_timeout: config.request_timeout,
            tracker: tracker.clone(),
            outbound: Some(outbound_tx),
            inbound: inbound_rx,
            closed,
            expired_tx,
            expired_rx,
            pending: HashMap::new(),
            timers: HashMap::new(),
        }
    }

    /// Number of requests awaiting a reply.
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Run until the generation has to end.
    pub(crate) async fn run(
        &mut self,
        outgoing: &mut mpsc::Receiver<Box<dyn Request>>,
        incoming: &mpsc::Sender<StreamMessage>,
        shutdown: &CancellationToken,
    ) -> Exit {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Exit::Shutdown,
                request = outgoing.recv() => {
                    let Some(request) = request else {
                        return Exit::Shutdown;
                    };
                    if let Err(exit) = self.accept(request).await {
                        return exit;
                    }
                }
                frame = self.inbound.recv() => {
                    let Some(frame) = frame else {
                        error!(generation = self.generation, "connection lost");
                        return Exit::Disconnected;
                    };
                    self.dispatch(&frame, incoming).await;
                }
                Some(id) = self.expired_rx.recv() => {
                    if let Some(exit) = self.expire(id) {
                        return exit;
                    }
                }
            }
        }
    }

    /// Record a request, hand its envelope to the write pump, and arm its
    /// timer.
    async fn accept(&mut self, request: Box<dyn Request>) -> Result<(), Exit> {
        let id = request.id();
        let envelope = request.envelope().clone();
        // Recorded before the handoff so a teardown fails it like any other.
        let _ = self.pending.insert(id, request);

        let Some(outbound) = self.outbound.as_ref() else {
            return Err(Exit::WriteFailed);
        };
        let handed_off = tokio::select! {
            _ = self.closed.cancelled() => false,
            sent = outbound.send(envelope) => sent.is_ok(),
        };
        if !handed_off {
            warn!(id, "write pump gone before request was sent");
            return Err(Exit::WriteFailed);
        }

        self.arm(id);
        Ok(())
    }

    fn arm(&mut self, id: u64) {
        let cancel = CancellationToken::new();
        let _ = self.timers.insert(id, cancel.clone());

        let expired = self.expired_tx.clone();
        let timeout = self.request_timeout;
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let _ = expired.send(id);
                }
            }
        });
    }

    async fn dispatch(&mut self, frame: &[u8], incoming: &mpsc::Sender<StreamMessage>) {
        trace!(frame = %dump(frame), "received");

        let header = match decode_header(frame) {
            Ok(header) => header,
            Err(err) => {
                warn!(error = %err, "dropping malformed frame");
                return;
            }
        };

        match header.route(&self.registry) {
            Route::Stream(kind) => match self.registry.decode(&kind, frame) {
                Some(Ok(message)) => {
                    if incoming.send(message).await.is_err() {
                        debug!(kind = %kind, "stream consumer gone");
                    }
                }
                Some(Err(err)) => {
                    warn!(kind = %kind, error = %err, "dropping undecodable stream message")
                }
                None => warn!(kind = %kind, "stream type has no decoder"),
            },
            Route::Reply(id) => self.resolve(id, frame),
            Route::Unroutable => warn!(kind = ?header.kind, "unexpected message"),
        }
    }

    fn resolve(&mut self, id: u64, frame: &[u8]) {
        let Some(request) = self.pending.remove(&id) else {
            warn!(id, "unexpected reply: no pending request");
            return;
        };
        if let Some(cancel) = self.timers.remove(&id) {
            cancel.cancel();
        }
        request.complete(frame);
    }

    /// Handle a timer firing. A timer for a request already resolved is a
    /// stale firing and is ignored.
    fn expire(&mut self, id: u64) -> Option<Exit> {
        let _ = self.timers.remove(&id);
        let request = self.pending.remove(&id)?;
        warn!(
            id,
            timeout = ?self.request_timeout,
            generation = self.generation,
            "request timed out, dropping connection"
        );
        request.fail(SessionError::Timeout(self.request_timeout));
        Some(Exit::Timeout)
    }

    /// Tear the generation down: stop the write pump, fail everything still
    /// pending, stop every timer, and wait for the read pump to exit.
    pub(crate) async fn teardown(mut self) {
        drop(self.outbound.take());
        self.closed.cancel();

        let failed = self.pending.len();
        for (_, request) in self.pending.drain() {
            request.fail(SessionError::disconnected());
        }
        for (_, cancel) in self.timers.drain() {
            cancel.cancel();
        }

        while self.inbound.recv().await.is_some() {}
        debug!(generation = self.generation, failed, "connection generation torn down");
    }
}
