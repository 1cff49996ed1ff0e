use std::time::Duration;

/// Errors that can occur in frame transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be parsed or uses an unsupported scheme.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// The dial did not complete within the connect timeout.
    #[error("connect to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    /// No frame (including keepalive acknowledgements) arrived within the read deadline.
    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    /// A send did not complete within the write deadline.
    #[error("send did not complete within {0:?}")]
    WriteTimeout(Duration),

    /// WebSocket protocol or I/O error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// True when the error was raised while establishing the connection.
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            TransportError::InvalidEndpoint { .. }
                | TransportError::Connect { .. }
                | TransportError::ConnectTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
