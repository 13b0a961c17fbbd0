//! Gateway session loop with exponential backoff.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::gateway::run_session;
use crate::pumps::read::SessionEnd;
use crate::types::{GatewayConfig, GatewayEvent};

/// Keeps a gateway session alive until cancelled or a fatal close.
///
/// The attempt counter resets after every session that reached `READY`.
pub(crate) async fn run(
    config: GatewayConfig,
    events_tx: mpsc::Sender<GatewayEvent>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        match run_session(&config, &events_tx, &cancel).await {
            Ok(outcome) => match outcome.end {
                SessionEnd::Cancelled => break,
                SessionEnd::Fatal(code) => {
                    error!(code, "gateway closed the connection permanently, not reconnecting");
                    let _ = events_tx.send(GatewayEvent::Disconnected).await;
                    break;
                }
                SessionEnd::Reconnect => {
                    if outcome.ready {
                        attempt = 0;
                    }
                    let _ = events_tx.send(GatewayEvent::Disconnected).await;
                }
            },
            Err(e) => warn!(attempt, error = %e, "gateway connection failed"),
        }

        if cancel.is_cancelled() {
            break;
        }

        attempt = attempt.saturating_add(1);
        let delay = config.reconnect.delay_for_attempt(attempt);
        let delay_secs = delay.as_secs_f64();
        let _ = events_tx
            .send(GatewayEvent::Reconnecting {
                attempt,
                next_retry_secs: delay_secs,
            })
            .await;
        info!(
            attempt,
            delay_secs = format_args!("{delay_secs:.1}"),
            "reconnecting to gateway"
        );

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!("gateway loop exited");
}
