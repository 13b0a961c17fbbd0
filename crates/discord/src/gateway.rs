//! Discord gateway client.
//!
//! One session = one WebSocket: wait for Hello, Identify, then run the
//! read, write and heartbeat pumps until the socket drops or the gateway
//! asks for a reconnect. [`Gateway`] keeps sessions going with backoff.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Error;
use crate::pumps::read::ReadOutcome;
use crate::pumps::write::Outbox;
use crate::types::{GatewayConfig, GatewayEvent, GatewayPayload, op};

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the background gateway connection.
pub struct Gateway {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Gateway {
    /// Connects in the background. Events arrive on the returned receiver.
    pub fn start(config: GatewayConfig) -> (Self, mpsc::Receiver<GatewayEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(crate::reconnection::run(config, events_tx, cancel.clone()));
        (Self { cancel, handle }, events_rx)
    }

    /// Closes the connection and waits for the background task.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

/// Runs one gateway session to completion.
pub(crate) async fn run_session(
    config: &GatewayConfig,
    events_tx: &mpsc::Sender<GatewayEvent>,
    cancel: &CancellationToken,
) -> Result<ReadOutcome, Error> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(config.url.as_str()).await?;
    let (write, mut read) = ws_stream.split();

    let heartbeat_interval = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Closed),
        hello = tokio::time::timeout(HELLO_TIMEOUT, read.next()) => {
            let frame = hello.map_err(|_| Error::Protocol("no Hello from gateway".into()))?;
            parse_hello(frame)?
        }
    };
    debug!(interval_ms = heartbeat_interval.as_millis() as u64, "gateway hello");

    let session = cancel.child_token();
    let (outbox, inbox) = Outbox::channel(64);
    let seq = Arc::new(AtomicU64::new(0));

    let write_handle = tokio::spawn(crate::pumps::write::write_pump(
        write,
        inbox,
        session.clone(),
    ));

    let identify = serde_json::to_string(&GatewayPayload::identify(&config.token, config.intents))?;
    if !outbox
        .send(tungstenite::Message::Text(identify.into()))
        .await
    {
        return Err(Error::Closed);
    }

    let heartbeat_handle = tokio::spawn(crate::pumps::heartbeat::heartbeat_pump(
        outbox.clone(),
        Arc::clone(&seq),
        heartbeat_interval,
        session.clone(),
    ));

    // A missed heartbeat ack shows up as silence: we always get an ack
    // within one interval on a live connection.
    let outcome = crate::pumps::read::read_pump(
        read,
        outbox,
        events_tx.clone(),
        seq,
        heartbeat_interval * 2,
        session.clone(),
    )
    .await;

    session.cancel();
    let _ = heartbeat_handle.await;
    let _ = write_handle.await;
    Ok(outcome)
}

fn parse_hello(
    frame: Option<Result<tungstenite::Message, tungstenite::Error>>,
) -> Result<Duration, Error> {
    let msg = frame.ok_or(Error::Closed)??;
    let text = match msg {
        tungstenite::Message::Text(text) => text,
        other => return Err(Error::Protocol(format!("expected Hello, got {other:?}"))),
    };
    let payload: GatewayPayload = serde_json::from_str(text.as_str())?;
    if payload.op != op::HELLO {
        return Err(Error::Protocol(format!("expected Hello, got op {}", payload.op)));
    }
    let millis = payload.d["heartbeat_interval"]
        .as_u64()
        .ok_or_else(|| Error::Protocol("Hello without heartbeat_interval".into()))?;
    Ok(Duration::from_millis(millis))
}
