//! Gateway read pump: tracks the sequence, answers heartbeat requests and
//! surfaces dispatches as [`GatewayEvent`]s.

use std::sync::atomic::Ordering;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::interaction::Interaction;
use crate::pumps::heartbeat::{Sequence, heartbeat_message};
use crate::pumps::write::Outbox;
use crate::types::{FATAL_CLOSE_CODES, GatewayEvent, GatewayPayload, op};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    Cancelled,
    /// Socket lost or the gateway asked us to reconnect.
    Reconnect,
    /// Closed with a code reconnecting will not fix.
    Fatal(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadOutcome {
    pub end: SessionEnd,
    /// Whether `READY` arrived during the session.
    pub ready: bool,
}

/// Reads frames until the session ends.
///
/// Any incoming frame resets the liveness deadline; silence for
/// `liveness` means the connection is dead.
pub(crate) async fn read_pump<S>(
    mut read: S,
    outbox: Outbox,
    events_tx: mpsc::Sender<GatewayEvent>,
    seq: Sequence,
    liveness: Duration,
    cancel: CancellationToken,
) -> ReadOutcome
where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(liveness);
    tokio::pin!(deadline);
    let mut ready = false;

    let end = loop {
        tokio::select! {
            _ = cancel.cancelled() => break SessionEnd::Cancelled,

            () = &mut deadline => {
                warn!("no gateway traffic within {}s, connection dead", liveness.as_secs());
                break SessionEnd::Reconnect;
            }

            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("gateway read error: {e}");
                        break SessionEnd::Reconnect;
                    }
                    None => {
                        debug!("gateway stream ended");
                        break SessionEnd::Reconnect;
                    }
                };
                deadline.as_mut().reset(tokio::time::Instant::now() + liveness);

                match msg {
                    tungstenite::Message::Text(text) => {
                        let payload: GatewayPayload = match serde_json::from_str(text.as_str()) {
                            Ok(p) => p,
                            Err(e) => {
                                warn!("failed to parse gateway payload: {e}");
                                continue;
                            }
                        };
                        if let Some(end) =
                            handle_payload(payload, &outbox, &events_tx, &seq, &mut ready).await
                        {
                            break end;
                        }
                    }
                    tungstenite::Message::Ping(data) => {
                        outbox.urgent(tungstenite::Message::Pong(data)).await;
                    }
                    tungstenite::Message::Close(frame) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        debug!(?code, "gateway sent close frame");
                        match code {
                            Some(code) if FATAL_CLOSE_CODES.contains(&code) => {
                                break SessionEnd::Fatal(code);
                            }
                            _ => break SessionEnd::Reconnect,
                        }
                    }
                    _ => {}
                }
            }
        }
    };

    ReadOutcome { end, ready }
}

async fn handle_payload(
    payload: GatewayPayload,
    outbox: &Outbox,
    events_tx: &mpsc::Sender<GatewayEvent>,
    seq: &Sequence,
    ready: &mut bool,
) -> Option<SessionEnd> {
    match payload.op {
        op::DISPATCH => {
            if let Some(s) = payload.s {
                seq.store(s, Ordering::Release);
            }
            let event = match payload.t.as_deref() {
                Some("READY") => {
                    *ready = true;
                    ready_event(&payload.d)
                }
                Some("INTERACTION_CREATE") => match Interaction::from_value(payload.d) {
                    Ok(i) => Some(GatewayEvent::Interaction(i)),
                    Err(e) => {
                        warn!("malformed interaction: {e}");
                        None
                    }
                },
                other => {
                    trace!(event = ?other, "ignoring dispatch");
                    None
                }
            };
            if let Some(event) = event
                && events_tx.send(event).await.is_err()
            {
                return Some(SessionEnd::Cancelled);
            }
            None
        }
        op::HEARTBEAT => {
            if let Some(msg) = heartbeat_message(seq) {
                outbox.urgent(msg).await;
            }
            None
        }
        op::HEARTBEAT_ACK => {
            trace!("heartbeat acknowledged");
            None
        }
        op::RECONNECT => {
            info!("gateway requested reconnect");
            Some(SessionEnd::Reconnect)
        }
        op::INVALID_SESSION => {
            warn!("gateway invalidated the session");
            Some(SessionEnd::Reconnect)
        }
        other => {
            trace!(op = other, "ignoring opcode");
            None
        }
    }
}

fn ready_event(d: &Value) -> Option<GatewayEvent> {
    let application_id = d["application"]["id"].as_str()?.to_string();
    let session_id = d["session_id"].as_str().unwrap_or_default().to_string();
    let user = d["user"]["username"].as_str().unwrap_or_default().to_string();
    Some(GatewayEvent::Ready {
        application_id,
        session_id,
        user,
    })
}
