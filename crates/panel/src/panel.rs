//! Entry points for the three request kinds: status requests, direct
//! actions, and panel button presses.

use std::sync::Arc;
use std::time::Duration;

use hostpanel_protocol::constants::{POLL_INTERVAL, STATUS_TIMEOUT};
use hostpanel_protocol::{ActionKind, PanelAction, ParseActionError};
use tracing::info;

use crate::dispatcher::{ActionDispatcher, ActionOutcome, SettleDelays};
use crate::frontend::{Frontend, FrontendError, PanelHandle};
use crate::reconciler::{ReconcileOutcome, Reconciler, Trigger};
use crate::scheduler::Scheduler;
use crate::source::{AgentApi, StateFetcher};
use crate::store::PanelState;

/// Engine timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    pub poll_interval: Duration,
    pub status_timeout: Duration,
    pub delays: SettleDelays,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            status_timeout: STATUS_TIMEOUT,
            delays: SettleDelays::default(),
        }
    }
}

/// What a button press led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    Refreshed(ReconcileOutcome),
    Dispatched(ActionOutcome),
}

pub struct ControlPanel {
    reconciler: Arc<Reconciler>,
    dispatcher: ActionDispatcher,
    scheduler: Scheduler,
    poll_interval: Duration,
}

impl ControlPanel {
    pub fn new(agent: Arc<dyn AgentApi>, frontend: Arc<dyn Frontend>, config: PanelConfig) -> Self {
        let fetcher = StateFetcher::new(Arc::clone(&agent)).with_timeout(config.status_timeout);
        let reconciler = Arc::new(Reconciler::new(fetcher, frontend));
        Self {
            dispatcher: ActionDispatcher::new(agent, Arc::clone(&reconciler), config.delays),
            scheduler: Scheduler::new(Arc::clone(&reconciler)),
            reconciler,
            poll_interval: config.poll_interval,
        }
    }

    /// Starts periodic reconciliation.
    pub async fn start(&self) {
        self.scheduler.start(self.poll_interval).await;
    }

    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }

    /// Posts a fresh panel in `channel_id`, replacing any existing one.
    pub async fn status(&self, channel_id: &str) -> Result<PanelHandle, FrontendError> {
        let trigger = Trigger::StatusRequest {
            channel_id: channel_id.to_string(),
        };
        match self.reconciler.reconcile(trigger).await {
            ReconcileOutcome::Created(handle) => Ok(handle),
            ReconcileOutcome::Failed(e) => Err(e),
            other => Err(FrontendError::Transport(format!(
                "status request ended without a panel: {other:?}"
            ))),
        }
    }

    /// Runs `kind` outside the panel. Reconciliation follows in the background.
    pub async fn act(&self, kind: ActionKind) -> ActionOutcome {
        self.dispatcher.dispatch(kind).await
    }

    /// Routes a button press on the message `origin`.
    ///
    /// When no panel is tracked (e.g. after a restart) `origin` becomes the
    /// panel before the action runs.
    pub async fn press(
        &self,
        custom_id: &str,
        origin: PanelHandle,
    ) -> Result<PressOutcome, ParseActionError> {
        let action: PanelAction = custom_id.parse()?;
        self.reconciler.adopt(origin).await;

        match action {
            PanelAction::Refresh => {
                info!("panel refresh requested");
                let outcome = self.reconciler.reconcile(Trigger::Refresh).await;
                Ok(PressOutcome::Refreshed(outcome))
            }
            PanelAction::Control(kind) => Ok(PressOutcome::Dispatched(self.act(kind).await)),
        }
    }

    /// Snapshot of the tracked panel.
    pub async fn panel(&self) -> PanelState {
        self.reconciler.store().current().await
    }
}
