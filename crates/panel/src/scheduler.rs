//! Periodic background reconciliation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::reconciler::{Reconciler, Trigger};

/// Runs a [`Trigger::Scheduled`] pass every period until stopped.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Scheduler {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            reconciler,
            cancel: Mutex::new(None),
        }
    }

    /// Starts ticking. The first pass runs one `period` from now.
    ///
    /// Restarting replaces the previous loop.
    pub async fn start(&self, period: Duration) {
        let mut slot = self.cancel.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        *slot = Some(cancel.clone());

        let reconciler = Arc::clone(&self.reconciler);
        tokio::spawn(async move {
            tick_loop(reconciler, period, cancel).await;
        });

        tracing::info!(period_secs = period.as_secs(), "status scheduler started");
    }

    pub async fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().await.take() {
            cancel.cancel();
            tracing::info!("status scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.cancel.lock().await.is_some()
    }
}

async fn tick_loop(reconciler: Arc<Reconciler>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // interval() fires immediately; the panel was just rendered.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = reconciler.reconcile(Trigger::Scheduled) => {}
                }
            }
        }
    }
    tracing::debug!("scheduler loop exited");
}

#[cfg(test)]
mod tests {
    use hostpanel_protocol::{HostState, StatusSnapshot};

    use super::*;
    use crate::testing::reconciler_with;

    const PERIOD: Duration = Duration::from_secs(30);

    fn online() -> StatusSnapshot {
        StatusSnapshot::new(HostState { online: true })
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (agent, _frontend, reconciler) = reconciler_with(online());
        let scheduler = Scheduler::new(Arc::new(reconciler));

        scheduler.start(PERIOD).await;
        settle().await;
        assert_eq!(agent.status_calls(), 0);

        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(agent.status_calls(), 1);

        tokio::time::sleep(PERIOD).await;
        settle().await;
        assert_eq!(agent.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticks() {
        let (agent, _frontend, reconciler) = reconciler_with(online());
        let scheduler = Scheduler::new(Arc::new(reconciler));

        scheduler.start(PERIOD).await;
        assert!(scheduler.is_running().await);
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);

        tokio::time::sleep(PERIOD * 3).await;
        settle().await;
        assert_eq!(agent.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_tracked_panel_when_state_moves() {
        let (agent, frontend, reconciler) = reconciler_with(online());
        let reconciler = Arc::new(reconciler);
        reconciler
            .reconcile(Trigger::StatusRequest {
                channel_id: "chan".into(),
            })
            .await;
        let scheduler = Scheduler::new(Arc::clone(&reconciler));
        scheduler.start(PERIOD).await;

        agent.set_status(StatusSnapshot::unreachable());
        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(frontend.edits().len(), 1);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_loop() {
        let (agent, _frontend, reconciler) = reconciler_with(online());
        let scheduler = Scheduler::new(Arc::new(reconciler));

        scheduler.start(PERIOD).await;
        scheduler.start(PERIOD).await;
        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(agent.status_calls(), 1);
    }
}
