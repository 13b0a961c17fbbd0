//! Gateway write pump: the only task that touches the socket's sink.
//!
//! Frames arrive on two lanes. The urgent lane (heartbeats, pongs) is always
//! drained first and never throttled. Ordinary payloads are held back once
//! the session nears Discord's limit of [`SEND_LIMIT`] payloads per
//! [`SEND_WINDOW`], leaving [`HEARTBEAT_RESERVE`] slots for heartbeats.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Payloads Discord accepts per [`SEND_WINDOW`] before closing the socket.
pub(crate) const SEND_LIMIT: usize = 120;
pub(crate) const SEND_WINDOW: Duration = Duration::from_secs(60);
/// Slots ordinary payloads may not use.
pub(crate) const HEARTBEAT_RESERVE: usize = 4;

/// Sending half of the two outbound lanes.
#[derive(Clone)]
pub(crate) struct Outbox {
    urgent: mpsc::Sender<Message>,
    frames: mpsc::Sender<Message>,
}

/// Receiving half, owned by [`write_pump`].
pub(crate) struct Inbox {
    pub(crate) urgent: mpsc::Receiver<Message>,
    pub(crate) frames: mpsc::Receiver<Message>,
}

impl Outbox {
    pub(crate) fn channel(capacity: usize) -> (Self, Inbox) {
        let (urgent_tx, urgent_rx) = mpsc::channel(capacity);
        let (frames_tx, frames_rx) = mpsc::channel(capacity);
        (
            Self {
                urgent: urgent_tx,
                frames: frames_tx,
            },
            Inbox {
                urgent: urgent_rx,
                frames: frames_rx,
            },
        )
    }

    /// Queues a heartbeat or pong ahead of everything else.
    /// Returns `false` once the pump is gone.
    pub(crate) async fn urgent(&self, msg: Message) -> bool {
        self.urgent.send(msg).await.is_ok()
    }

    /// Queues an ordinary payload. Returns `false` once the pump is gone.
    pub(crate) async fn send(&self, msg: Message) -> bool {
        self.frames.send(msg).await.is_ok()
    }
}

/// Sliding window of recent payload sends.
struct SendBudget {
    sent: VecDeque<Instant>,
}

impl SendBudget {
    fn new() -> Self {
        Self {
            sent: VecDeque::with_capacity(SEND_LIMIT),
        }
    }

    fn record(&mut self, at: Instant) {
        self.sent.push_back(at);
    }

    /// How long ordinary payloads must wait; zero when one may go now.
    fn wait(&mut self, now: Instant) -> Duration {
        while let Some(&oldest) = self.sent.front() {
            if now.duration_since(oldest) >= SEND_WINDOW {
                self.sent.pop_front();
            } else {
                break;
            }
        }
        if self.sent.len() < SEND_LIMIT - HEARTBEAT_RESERVE {
            return Duration::ZERO;
        }
        self.sent
            .front()
            .map(|&oldest| (oldest + SEND_WINDOW).saturating_duration_since(now))
            .unwrap_or_default()
    }
}

pub(crate) async fn write_pump<S>(mut write: S, mut inbox: Inbox, cancel: CancellationToken)
where
    S: SinkExt<Message, Error = tungstenite::Error> + Unpin,
{
    let mut budget = SendBudget::new();

    loop {
        let wait = budget.wait(Instant::now());
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = inbox.urgent.recv() => match msg {
                Some(msg) => forward(&mut write, msg, &mut budget).await,
                None => break,
            },
            () = tokio::time::sleep(wait), if !wait.is_zero() => continue,
            msg = inbox.frames.recv(), if wait.is_zero() => match msg {
                Some(msg) => forward(&mut write, msg, &mut budget).await,
                None => break,
            },
        };
        if !sent {
            break;
        }
        if wait.is_zero() && budget.wait(Instant::now()) > Duration::ZERO {
            debug!("gateway send budget exhausted, holding payloads");
        }
    }

    let _ = write.send(Message::Close(None)).await;
}

/// Writes one frame. Only text payloads count against the budget.
async fn forward<S>(write: &mut S, msg: Message, budget: &mut SendBudget) -> bool
where
    S: SinkExt<Message, Error = tungstenite::Error> + Unpin,
{
    let counted = msg.is_text();
    if let Err(e) = write.send(msg).await {
        error!(error = %e, "gateway write failed");
        return false;
    }
    if counted {
        budget.record(Instant::now());
    }
    true
}
