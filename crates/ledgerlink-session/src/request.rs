//! The request capability handed to the arbitration loop.
//!
//! A [`Request`] is consumed by exactly one of [`Request::complete`] or
//! [`Request::fail`]; both take `self: Box<Self>`, so a request cannot be
//! resolved twice. [`Command`] is the stock implementation: it decodes the
//! reply into `R` and hands it to the paired [`Pending`] handle.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use ledgerlink_frame::{decode_reply, OutboundEnvelope, Reply};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{Result, SessionError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a correlation id, unique for the life of the process.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A submitted request awaiting its reply.
pub trait Request: Send + 'static {
    /// Correlation id carried by [`envelope`](Request::envelope).
    fn id(&self) -> u64;

    /// Envelope to put on the wire.
    fn envelope(&self) -> &OutboundEnvelope;

    /// Resolve with the raw reply frame matched by id.
    fn complete(self: Box<Self>, frame: &[u8]);

    /// Resolve with an error (timeout, disconnect, shutdown).
    fn fail(self: Box<Self>, error: SessionError);
}

/// A typed request whose reply `result` decodes into `R`.
pub struct Command<R> {
    envelope: OutboundEnvelope,
    reply_tx: oneshot::Sender<Result<R>>,
}

impl<R> Command<R>
where
    R: DeserializeOwned + Send + 'static,
{
    /// Build a command with a fresh id.
    ///
    /// Params are materialized here, so an unserializable value is reported
    /// to the caller before anything is queued.
    pub fn new<P: Serialize + ?Sized>(command: &str, params: &P) -> Result<(Self, Pending<R>)> {
        let id = next_id();
        let envelope =
            OutboundEnvelope::from_params(id, command, params).map_err(SessionError::Encode)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        Ok((
            Self { envelope, reply_tx },
            Pending {
                id,
                reply_rx,
                _result: PhantomData,
            },
        ))
    }

    fn resolve(self, outcome: Result<R>) {
        // The caller may have stopped waiting.
        let _ = self.reply_tx.send(outcome);
    }
}

impl<R> Request for Command<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn id(&self) -> u64 {
        self.envelope.id
    }

    fn envelope(&self) -> &OutboundEnvelope {
        &self.envelope
    }

    fn complete(self: Box<Self>, frame: &[u8]) {
        let outcome = match decode_reply::<R>(frame) {
            Ok(Reply::Success(result)) => Ok(result),
            Ok(Reply::Error(remote)) => Err(SessionError::Remote(remote)),
            Err(err) => {
                warn!(
                    id = self.envelope.id,
                    command = %self.envelope.command,
                    error = %err,
                    "reply decode failed"
                );
                Err(SessionError::Decode(err))
            }
        };
        self.resolve(outcome);
    }

    fn fail(self: Box<Self>, error: SessionError) {
        self.resolve(Err(error));
    }
}

impl<R> fmt::Debug for Command<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.envelope.id)
            .field("command", &self.envelope.command)
            .finish()
    }
}

/// Caller side of a [`Command`].
#[derive(Debug)]
pub struct Pending<R> {
    id: u64,
    reply_rx: oneshot::Receiver<Result<R>>,
    _result: PhantomData<fn() -> R>,
}

impl<R> Pending<R> {
    /// Correlation id of the paired command.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the command to be resolved.
    ///
    /// A command dropped without resolution (its session shut down before
    /// taking it) reports [`SessionError::Closed`].
    pub async fn wait(self) -> Result<R> {
        self.reply_rx.await.unwrap_or(Err(SessionError::Closed))
    }
}
