//! Fetch → compare → render.
//!
//! One pass holds the [`PanelStore`] lock from the status fetch until the
//! panel edit has finished, so two passes can never both decide "changed"
//! and render over each other.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::frontend::{Frontend, FrontendError, PanelHandle};
use crate::guard::{GuardOutcome, LifecycleGuard};
use crate::source::StateFetcher;
use crate::store::{PanelLock, PanelState, PanelStore};
use crate::view;

/// Why a pass runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Periodic tick. Skipped when another pass is in flight.
    Scheduled,
    /// Explicit request for a fresh panel in `channel_id`.
    StatusRequest { channel_id: String },
    /// Settle-delayed pass after a mutating action.
    PostAction,
    /// The panel's refresh button.
    Refresh,
}

impl Trigger {
    fn name(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::StatusRequest { .. } => "status_request",
            Self::PostAction => "post_action",
            Self::Refresh => "refresh",
        }
    }
}

/// What a pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Another pass held the store; nothing fetched.
    Skipped,
    /// Snapshot equal to the rendered one.
    Unchanged,
    /// Snapshot changed but no panel exists to show it.
    NoPanel,
    /// The existing panel was edited.
    Updated,
    /// A new panel was posted.
    Created(PanelHandle),
    /// The panel had been deleted; the store is now empty.
    Vanished,
    Failed(FrontendError),
}

pub struct Reconciler {
    fetcher: StateFetcher,
    frontend: Arc<dyn Frontend>,
    store: PanelStore,
}

impl Reconciler {
    pub fn new(fetcher: StateFetcher, frontend: Arc<dyn Frontend>) -> Self {
        Self {
            fetcher,
            frontend,
            store: PanelStore::new(),
        }
    }

    pub fn store(&self) -> &PanelStore {
        &self.store
    }

    /// Runs one reconciliation pass.
    pub async fn reconcile(&self, trigger: Trigger) -> ReconcileOutcome {
        let mut state = match trigger {
            Trigger::Scheduled => match self.store.try_lock() {
                Some(state) => state,
                None => {
                    debug!("reconciliation already in flight, skipping tick");
                    return ReconcileOutcome::Skipped;
                }
            },
            _ => self.store.lock().await,
        };

        let outcome = match &trigger {
            Trigger::StatusRequest { channel_id } => self.recreate(&mut state, channel_id).await,
            _ => self.refresh(&mut state).await,
        };

        match &outcome {
            ReconcileOutcome::Failed(e) => {
                warn!(trigger = trigger.name(), error = %e, "reconciliation failed")
            }
            ReconcileOutcome::Unchanged | ReconcileOutcome::Skipped => {
                debug!(trigger = trigger.name(), ?outcome, "reconciliation done")
            }
            _ => info!(trigger = trigger.name(), ?outcome, "reconciliation done"),
        }
        outcome
    }

    /// Takes over `handle` as the panel if none is tracked.
    pub async fn adopt(&self, handle: PanelHandle) -> bool {
        let adopted = self.store.lock().await.adopt(handle.clone());
        if adopted {
            info!(panel = %handle, "adopted existing panel message");
        }
        adopted
    }

    /// Always posts a brand-new panel, replacing any previous one.
    async fn recreate(&self, state: &mut PanelLock<'_>, channel_id: &str) -> ReconcileOutcome {
        let snapshot = self.fetcher.fetch().await;
        let guard = LifecycleGuard::new(self.frontend.as_ref());

        if let Some(old) = state.target.clone() {
            match guard.delete(state, &old).await {
                Ok(_) => debug!(panel = %old, "previous panel removed"),
                Err(e) => warn!(panel = %old, error = %e, "failed to delete previous panel"),
            }
        }
        state.clear();

        let view = view::build(&snapshot);
        match self.frontend.render(channel_id, &view).await {
            Ok(handle) => {
                state.replace(handle.clone(), snapshot);
                ReconcileOutcome::Created(handle)
            }
            Err(e) => ReconcileOutcome::Failed(e),
        }
    }

    /// Edits the existing panel if the snapshot moved. Never creates one.
    async fn refresh(&self, state: &mut PanelLock<'_>) -> ReconcileOutcome {
        let snapshot = self.fetcher.fetch().await;
        let previous = state.last_rendered.clone();

        if !state.update_if_changed(&snapshot) {
            return ReconcileOutcome::Unchanged;
        }

        let Some(handle) = state.target.clone() else {
            return ReconcileOutcome::NoPanel;
        };

        let view = view::build(&snapshot);
        let guard = LifecycleGuard::new(self.frontend.as_ref());
        let state: &mut PanelState = state;
        match guard.edit(state, &handle, &view).await {
            Ok(GuardOutcome::Done) => ReconcileOutcome::Updated,
            Ok(GuardOutcome::Vanished) => ReconcileOutcome::Vanished,
            Err(e) => {
                // The panel still shows the old state; let the next pass retry.
                state.last_rendered = previous;
                ReconcileOutcome::Failed(e)
            }
        }
    }
}
