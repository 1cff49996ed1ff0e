use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::traits::{Connector, FrameSink, FrameStream, OutboundFrame, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport to a ledger node.
///
/// Dials `ws://` or `wss://` endpoints. Each connection is split into a
/// [`WebSocketSink`] (write deadline per send) and a [`WebSocketReceiver`]
/// (read deadline refreshed on every frame, pongs included).
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    endpoint: Url,
    config: TransportConfig,
}

impl WebSocketConnector {
    /// Parse and validate an endpoint URI.
    pub fn new(endpoint: &str, config: TransportConfig) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|err| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(TransportError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: format!("unsupported scheme '{other}' (expected ws or wss)"),
                })
            }
        }

        if url.host_str().is_none() {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            endpoint: url,
            config,
        })
    }

    /// Connection deadlines in effect.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "websocket"
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Transport> {
        let endpoint = self.endpoint.as_str();
        let dial = connect_async(endpoint);
        let (ws, _response) = tokio::time::timeout(self.config.connect_timeout, dial)
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                endpoint: endpoint.to_string(),
                timeout: self.config.connect_timeout,
            })?
            .map_err(|err| connect_error(endpoint, err))?;

        debug!(endpoint, "websocket connected");

        let (sink, stream) = ws.split();
        Ok(Transport::new(
            WebSocketSink {
                inner: sink,
                write_timeout: self.config.write_timeout,
            },
            WebSocketReceiver {
                inner: stream,
                read_timeout: self.config.read_timeout,
            },
        ))
    }

    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

/// Sending half of a WebSocket connection.
pub struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
    write_timeout: Duration,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send(&mut self, frame: OutboundFrame) -> Result<()> {
        let message = match frame {
            OutboundFrame::Text(text) => Message::Text(text.into()),
            OutboundFrame::Ping => Message::Ping(Bytes::new()),
            OutboundFrame::Close => Message::Close(None),
        };

        tokio::time::timeout(self.write_timeout, self.inner.send(message))
            .await
            .map_err(|_| TransportError::WriteTimeout(self.write_timeout))?
            .map_err(TransportError::from)
    }
}

/// Receiving half of a WebSocket connection.
pub struct WebSocketReceiver {
    inner: SplitStream<WsStream>,
    read_timeout: Duration,
}

#[async_trait]
impl FrameStream for WebSocketReceiver {
    async fn receive(&mut self) -> Result<Bytes> {
        loop {
            // A fresh deadline per frame: any frame, pong included, refreshes it.
            let next = tokio::time::timeout(self.read_timeout, self.inner.next())
                .await
                .map_err(|_| TransportError::ReadTimeout(self.read_timeout))?;

            match next {
                None => return Err(TransportError::Closed),
                Some(Err(err)) => return Err(err.into()),
                Some(Ok(message)) => match message {
                    Message::Text(_) | Message::Binary(_) => return Ok(message.into_data()),
                    Message::Pong(_) => trace!("pong received"),
                    Message::Ping(_) | Message::Frame(_) => {}
                    Message::Close(frame) => {
                        debug!(?frame, "close frame received");
                        return Err(TransportError::Closed);
                    }
                },
            }
        }
    }
}

fn connect_error(endpoint: &str, err: tungstenite::Error) -> TransportError {
    let source = match err {
        tungstenite::Error::Io(io) => io,
        other => std::io::Error::other(other.to_string()),
    };
    TransportError::Connect {
        endpoint: endpoint.to_string(),
        source,
    }
}
