use std::time::Duration;

use ledgerlink_frame::{FrameError, RemoteError};
use ledgerlink_transport::TransportError;

/// Reason attached to requests failed by a connection teardown.
pub const SERVER_DISCONNECTED: &str = "server disconnected";

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Dialing the endpoint failed. Only returned by `open`; reconnect
    /// failures are logged and retried instead.
    #[error("connect failed: {0}")]
    Connect(#[from] TransportError),

    /// The connection went away while the request was pending, or the
    /// request was submitted while the session was reconnecting.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// No reply arrived in time. The connection generation that carried the
    /// request is torn down.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The reply arrived but its body did not decode into the expected type.
    #[error("reply decode failed: {0}")]
    Decode(#[source] FrameError),

    /// The node answered with `status: "error"`.
    #[error("remote error: {0}")]
    Remote(RemoteError),

    /// Request params could not be materialized as a JSON object.
    #[error("request encode failed: {0}")]
    Encode(#[source] FrameError),

    /// A reply was well-formed but missing something the command requires.
    #[error("unexpected reply: {0}")]
    Protocol(String),

    /// The session has been closed.
    #[error("session closed")]
    Closed,
}

impl SessionError {
    pub(crate) fn disconnected() -> Self {
        SessionError::Disconnected(SERVER_DISCONNECTED.to_string())
    }

    /// Check if this error is tied to connection state rather than to the
    /// request itself.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            SessionError::Connect(_)
                | SessionError::Disconnected(_)
                | SessionError::Timeout(_)
                | SessionError::Closed
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
