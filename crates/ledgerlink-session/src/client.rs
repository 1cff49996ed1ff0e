use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{Result, SessionError};
use crate::request::{Command, Request};

/// Cloneable handle for submitting requests to a session.
///
/// Besides the typed commands (`fee`, `account_info`, ...) it exposes the
/// submission plumbing they share.
#[derive(Clone)]
pub struct Client {
    outgoing: mpsc::Sender<Box<dyn Request>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Client {
    pub(crate) fn new(
        outgoing: mpsc::Sender<Box<dyn Request>>,
        shutdown: CancellationToken,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            outgoing,
            shutdown,
            tracker,
        }
    }

    /// Queue a request. Waits while the outgoing queue is full.
    ///
    /// If the session is closed the request is failed with
    /// [`SessionError::Closed`] and the same error is returned.
    pub async fn submit_request(&self, request: Box<dyn Request>) -> Result<()> {
        if self.shutdown.is_cancelled() {
            request.fail(SessionError::Closed);
            return Err(SessionError::Closed);
        }
        match self.outgoing.send(request).await {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(request)) => {
                request.fail(SessionError::Closed);
                Err(SessionError::Closed)
            }
        }
    }

    /// Submit `command` with `params` and wait for its decoded result.
    pub async fn call<R, P>(&self, command: &str, params: &P) -> Result<R>
    where
        R: DeserializeOwned + Send + 'static,
        P: Serialize + ?Sized,
    {
        let (command, pending) = Command::<R>::new(command, params)?;
        self.submit_request(Box::new(command)).await?;
        pending.wait().await
    }

    /// Submit an arbitrary command and return its `result` object untyped.
    pub async fn request_raw(&self, command: &str, params: Value) -> Result<Value> {
        self.call(command, &params).await
    }

    /// Check if the owning session has begun closing.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("closed", &self.is_closed())
            .finish()
    }
}
