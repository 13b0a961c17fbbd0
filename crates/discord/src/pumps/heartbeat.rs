//! Gateway heartbeat pump.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::pumps::write::Outbox;
use crate::types::GatewayPayload;

/// Last dispatch sequence number; 0 until the first dispatch arrives.
pub(crate) type Sequence = Arc<AtomicU64>;

pub(crate) fn heartbeat_message(seq: &AtomicU64) -> Option<tungstenite::Message> {
    let last = match seq.load(Ordering::Acquire) {
        0 => None,
        n => Some(n),
    };
    match serde_json::to_string(&GatewayPayload::heartbeat(last)) {
        Ok(json) => Some(tungstenite::Message::Text(json.into())),
        Err(e) => {
            warn!("failed to encode heartbeat: {e}");
            None
        }
    }
}

/// Sends a heartbeat every `period` carrying the last sequence number.
pub(crate) async fn heartbeat_pump(
    outbox: Outbox,
    seq: Sequence,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(msg) = heartbeat_message(&seq) else { continue };
                trace!("sending heartbeat");
                if !outbox.urgent(msg).await {
                    break;
                }
            }
        }
    }
}
