//! The read and write pumps of one connection generation.
//!
//! The read pump moves raw frames from the transport to the arbitration
//! loop; the write pump serializes envelopes onto the transport and keeps
//! the connection alive with pings. Neither touches pending-request state.

use std::time::Duration;

use bytes::Bytes;
use ledgerlink_frame::OutboundEnvelope;
use ledgerlink_transport::{FrameSink, FrameStream, OutboundFrame};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Forward every received frame to `inbound` until the transport fails or
/// `closed` is cancelled.
///
/// Dropping `inbound` on return is what tells the arbitration loop that the
/// pump has exited.
pub(crate) async fn read_pump(
    mut stream: Box<dyn FrameStream>,
    inbound: mpsc::Sender<Bytes>,
    closed: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = closed.cancelled() => {
                debug!("read pump stopped: connection closed locally");
                return;
            }
            received = stream.receive() => received,
        };

        match received {
            Ok(frame) => {
                if inbound.send(frame).await.is_err() {
                    debug!("read pump stopped: arbitration loop gone");
                    return;
                }
            }
            Err(err) => {
                warn!(error = %err, "read pump stopped");
                return;
            }
        }
    }
}

/// Send queued envelopes and keepalive pings until `outbound` closes or a
/// send fails, then send a best-effort close frame.
pub(crate) async fn write_pump(
    mut sink: Box<dyn FrameSink>,
    mut outbound: mpsc::Receiver<OutboundEnvelope>,
    ping_interval: Duration,
) {
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            envelope = outbound.recv() => {
                let Some(envelope) = envelope else {
                    debug!("write pump stopped: outbound closed");
                    break;
                };
                match envelope.encode() {
                    Ok(text) => {
                        trace!(id = envelope.id, frame = %text, "sending");
                        OutboundFrame::Text(text)
                    }
                    Err(err) => {
                        error!(
                            id = envelope.id,
                            command = %envelope.command,
                            error = %err,
                            "dropping unserializable envelope"
                        );
                        continue;
                    }
                }
            }
            _ = ping.tick() => OutboundFrame::Ping,
        };

        if let Err(err) = sink.send(frame).await {
            warn!(error = %err, "write pump stopped");
            break;
        }
    }

    sink.close().await;
}
