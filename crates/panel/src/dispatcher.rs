//! Mutating actions against the control agent.
//!
//! One remote call per action, no retries. While an action on a target (the
//! host, or one service) is in flight, further actions on that target are
//! refused without touching the agent. Every completed action schedules one
//! settle-delayed reconciliation pass in the background.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hostpanel_protocol::constants::{RESTART_SETTLE_DELAY, SETTLE_DELAY};
use hostpanel_protocol::{ActionKind, ActionTarget};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::reconciler::{ReconcileOutcome, Reconciler, Trigger};
use crate::source::AgentApi;

/// Result of a dispatched action. `payload` is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub succeeded: bool,
    /// HTTP status, absent when the call never got a response.
    pub status: Option<u16>,
    pub payload: String,
}

impl ActionOutcome {
    fn refused(target: &ActionTarget) -> Self {
        Self {
            succeeded: false,
            status: None,
            payload: format!("another action is already in progress for {target}"),
        }
    }
}

/// Wait before the post-action reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// Start/stop-class actions.
    pub settle: Duration,
    /// Restart-class actions.
    pub restart: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            settle: SETTLE_DELAY,
            restart: RESTART_SETTLE_DELAY,
        }
    }
}

impl SettleDelays {
    pub fn for_kind(&self, kind: &ActionKind) -> Duration {
        if kind.is_restart() {
            self.restart
        } else {
            self.settle
        }
    }
}

pub struct ActionDispatcher {
    agent: Arc<dyn AgentApi>,
    reconciler: Arc<Reconciler>,
    delays: SettleDelays,
    in_flight: Mutex<HashSet<ActionTarget>>,
}

/// Releases a target when the dispatch that claimed it finishes.
struct Claim<'a> {
    in_flight: &'a Mutex<HashSet<ActionTarget>>,
    target: ActionTarget,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.target);
        }
    }
}

impl ActionDispatcher {
    pub fn new(agent: Arc<dyn AgentApi>, reconciler: Arc<Reconciler>, delays: SettleDelays) -> Self {
        Self {
            agent,
            reconciler,
            delays,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Dispatches `kind` and schedules the follow-up reconciliation.
    pub async fn dispatch(&self, kind: ActionKind) -> ActionOutcome {
        self.dispatch_with_followup(kind).await.0
    }

    /// Like [`dispatch`](Self::dispatch), also returning the scheduled
    /// reconciliation job (absent when the action was refused).
    pub async fn dispatch_with_followup(
        &self,
        kind: ActionKind,
    ) -> (ActionOutcome, Option<JoinHandle<ReconcileOutcome>>) {
        let target = kind.target();
        let Some(claim) = self.claim(&target) else {
            warn!(action = %kind, %target, "action refused, target busy");
            return (ActionOutcome::refused(&target), None);
        };

        let outcome = match self.agent.run(&kind).await {
            Ok(resp) => ActionOutcome {
                succeeded: resp.is_success(),
                status: Some(resp.status),
                payload: resp.body,
            },
            Err(e) => ActionOutcome {
                succeeded: false,
                status: None,
                payload: e.to_string(),
            },
        };
        drop(claim);

        if outcome.succeeded {
            info!(action = %kind, status = ?outcome.status, "action succeeded");
        } else {
            warn!(
                action = %kind,
                status = ?outcome.status,
                payload = %outcome.payload,
                "action failed"
            );
        }

        let followup = self.schedule_reconcile(self.delays.for_kind(&kind));
        (outcome, Some(followup))
    }

    fn claim(&self, target: &ActionTarget) -> Option<Claim<'_>> {
        let inserted = self
            .in_flight
            .lock()
            .map(|mut set| set.insert(target.clone()))
            .unwrap_or(false);
        inserted.then(|| Claim {
            in_flight: &self.in_flight,
            target: target.clone(),
        })
    }

    fn schedule_reconcile(&self, delay: Duration) -> JoinHandle<ReconcileOutcome> {
        let reconciler = Arc::clone(&self.reconciler);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            reconciler.reconcile(Trigger::PostAction).await
        })
    }
}

#[cfg(test)]
mod tests {
    use hostpanel_protocol::{Health, HostState, ServiceState, StatusSnapshot};

    use super::*;
    use crate::frontend::FrontendError;
    use crate::testing::{FakeAgent, FakeFrontend, reconciler_with};

    fn online() -> StatusSnapshot {
        StatusSnapshot::new(HostState { online: true })
            .with_service("x", ServiceState::new(Health::Unhealthy, 0, 10))
    }

    fn setup() -> (Arc<FakeAgent>, Arc<FakeFrontend>, Arc<Reconciler>, ActionDispatcher) {
        let (agent, frontend, reconciler) = reconciler_with(online());
        let reconciler = Arc::new(reconciler);
        let dispatcher = ActionDispatcher::new(
            Arc::clone(&agent) as Arc<dyn AgentApi>,
            Arc::clone(&reconciler),
            SettleDelays::default(),
        );
        (agent, frontend, reconciler, dispatcher)
    }

    async fn open_panel(reconciler: &Reconciler) {
        let outcome = reconciler
            .reconcile(Trigger::StatusRequest {
                channel_id: "chan".into(),
            })
            .await;
        assert!(matches!(outcome, ReconcileOutcome::Created(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_reconciles_after_settle_delay() {
        let (agent, frontend, reconciler, dispatcher) = setup();
        open_panel(&reconciler).await;

        let started = online().with_service("x", ServiceState::new(Health::Starting, 0, 10));
        agent.set_status(started);
        let before = tokio::time::Instant::now();
        let (outcome, followup) = dispatcher
            .dispatch_with_followup(ActionKind::ServiceStart("x".into()))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.status, Some(200));
        assert!(frontend.edits().is_empty());

        let pass = followup.unwrap().await.unwrap();
        assert_eq!(pass, ReconcileOutcome::Updated);
        assert!(before.elapsed() >= SETTLE_DELAY);
        assert_eq!(agent.actions(), vec![ActionKind::ServiceStart("x".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_longer() {
        let (_agent, _frontend, _reconciler, dispatcher) = setup();
        let before = tokio::time::Instant::now();

        let (_, followup) = dispatcher
            .dispatch_with_followup(ActionKind::PowerRestart)
            .await;
        followup.unwrap().await.unwrap();

        assert!(before.elapsed() >= RESTART_SETTLE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_passes_payload_and_still_reconciles() {
        let (agent, frontend, reconciler, dispatcher) = setup();
        open_panel(&reconciler).await;
        let body = r#"{"status":"error","message":"Container not found"}"#;
        agent.respond_with(404, body);

        let (outcome, followup) = dispatcher
            .dispatch_with_followup(ActionKind::ServiceStart("x".into()))
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.status, Some(404));
        assert_eq!(outcome.payload, body);

        // Remote state did not move: the pass runs but leaves the panel alone.
        assert_eq!(followup.unwrap().await.unwrap(), ReconcileOutcome::Unchanged);
        assert!(frontend.edits().is_empty());
        let shown = reconciler.store().current().await.last_rendered.unwrap();
        assert_eq!(shown, online());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_service_is_a_visible_failure() {
        let (agent, _frontend, reconciler, dispatcher) = setup();
        agent.respond_with(400, r#"{"status":"error","message":"Unknown server"}"#);

        let outcome = dispatcher.dispatch(ActionKind::ServiceStop("nope".into())).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.status, Some(400));
        assert!(outcome.payload.contains("Unknown server"));
        assert!(reconciler.store().current().await.target.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_has_no_status() {
        let (agent, _frontend, _reconciler, dispatcher) = setup();
        agent.drop_actions();

        let (outcome, followup) = dispatcher.dispatch_with_followup(ActionKind::PowerOff).await;

        assert!(!outcome.succeeded);
        assert!(outcome.status.is_none());
        assert!(!outcome.payload.is_empty());
        assert!(followup.is_some());
    }

    #[tokio::test]
    async fn same_target_is_refused_while_in_flight() {
        let (agent, _frontend, _reconciler, dispatcher) = setup();
        let dispatcher = Arc::new(dispatcher);
        let entered = agent.hold_actions();

        let first = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(ActionKind::ServiceStart("x".into())).await })
        };
        entered.notified().await;

        let (refused, followup) = dispatcher
            .dispatch_with_followup(ActionKind::ServiceStop("x".into()))
            .await;
        assert!(!refused.succeeded);
        assert!(refused.status.is_none());
        assert!(refused.payload.contains("already in progress"));
        assert!(followup.is_none());

        agent.release_actions();
        assert!(first.await.unwrap().succeeded);
        assert_eq!(agent.actions(), vec![ActionKind::ServiceStart("x".into())]);

        // Released once the first call finished.
        assert!(dispatcher.dispatch(ActionKind::ServiceStop("x".into())).await.succeeded);
    }

    #[tokio::test]
    async fn different_targets_run_concurrently() {
        let (agent, _frontend, _reconciler, dispatcher) = setup();
        let dispatcher = Arc::new(dispatcher);
        let entered = agent.hold_actions();

        let service = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(ActionKind::ServiceStart("x".into())).await })
        };
        entered.notified().await;
        let host = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(ActionKind::PowerOff).await })
        };
        entered.notified().await;

        agent.release_actions();
        assert!(service.await.unwrap().succeeded);
        assert!(host.await.unwrap().succeeded);
        assert_eq!(agent.actions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn followup_recovers_from_vanished_panel() {
        let (agent, frontend, reconciler, dispatcher) = setup();
        open_panel(&reconciler).await;
        agent.set_status(StatusSnapshot::unreachable());
        frontend.fail_next_edit(FrontendError::NotFound);

        let (_, followup) = dispatcher.dispatch_with_followup(ActionKind::PowerOff).await;

        assert_eq!(followup.unwrap().await.unwrap(), ReconcileOutcome::Vanished);
        assert!(reconciler.store().current().await.target.is_none());
    }

    #[test]
    fn settle_delays_by_class() {
        let delays = SettleDelays {
            settle: Duration::from_secs(1),
            restart: Duration::from_secs(2),
        };
        assert_eq!(delays.for_kind(&ActionKind::PowerOn), Duration::from_secs(1));
        assert_eq!(
            delays.for_kind(&ActionKind::ServiceRestart("x".into())),
            Duration::from_secs(2)
        );
    }
}
