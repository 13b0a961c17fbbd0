//! In-memory agent and front end for engine tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hostpanel_agent_client::{Error as AgentError, RawResponse};
use hostpanel_protocol::{ActionKind, StatusSnapshot};
use tokio::sync::{Notify, Semaphore};

use crate::frontend::{Frontend, FrontendError, FrontendFuture, PanelHandle};
use crate::reconciler::Reconciler;
use crate::source::{AgentApi, AgentFuture, StateFetcher};
use crate::view::PanelView;

/// Blocks calls until released; signals `entered` when a call starts waiting.
#[derive(Default)]
struct Gate {
    inner: Mutex<Option<(Arc<Notify>, Arc<Semaphore>)>>,
}

impl Gate {
    fn hold(&self) -> Arc<Notify> {
        let entered = Arc::new(Notify::new());
        *self.inner.lock().unwrap() = Some((Arc::clone(&entered), Arc::new(Semaphore::new(0))));
        entered
    }

    fn release(&self) {
        if let Some((_, sem)) = self.inner.lock().unwrap().take() {
            sem.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    async fn pass(&self) {
        let held = self.inner.lock().unwrap().clone();
        if let Some((entered, sem)) = held {
            entered.notify_one();
            let _ = sem.acquire().await;
        }
    }
}

pub(crate) struct FakeAgent {
    status: Mutex<Result<StatusSnapshot, u16>>,
    hang: AtomicBool,
    status_gate: Gate,
    action_response: Mutex<Option<RawResponse>>,
    action_gate: Gate,
    actions: Mutex<Vec<ActionKind>>,
    status_calls: AtomicU64,
}

impl FakeAgent {
    pub(crate) fn new(snapshot: StatusSnapshot) -> Self {
        Self {
            status: Mutex::new(Ok(snapshot)),
            hang: AtomicBool::new(false),
            status_gate: Gate::default(),
            action_response: Mutex::new(Some(RawResponse {
                status: 200,
                body: r#"{"status":"ok","message":"done"}"#.into(),
            })),
            action_gate: Gate::default(),
            actions: Mutex::new(Vec::new()),
            status_calls: AtomicU64::new(0),
        }
    }

    pub(crate) fn set_status(&self, snapshot: StatusSnapshot) {
        *self.status.lock().unwrap() = Ok(snapshot);
    }

    pub(crate) fn fail_status(&self, code: u16) {
        *self.status.lock().unwrap() = Err(code);
    }

    pub(crate) fn hang_status(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub(crate) fn hold_status(&self) -> Arc<Notify> {
        self.status_gate.hold()
    }

    pub(crate) fn release_status(&self) {
        self.status_gate.release();
    }

    pub(crate) fn status_calls(&self) -> u64 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn respond_with(&self, status: u16, body: &str) {
        *self.action_response.lock().unwrap() = Some(RawResponse {
            status,
            body: body.into(),
        });
    }

    /// Makes action calls fail at the transport level.
    pub(crate) fn drop_actions(&self) {
        *self.action_response.lock().unwrap() = None;
    }

    pub(crate) fn hold_actions(&self) -> Arc<Notify> {
        self.action_gate.hold()
    }

    pub(crate) fn release_actions(&self) {
        self.action_gate.release();
    }

    pub(crate) fn actions(&self) -> Vec<ActionKind> {
        self.actions.lock().unwrap().clone()
    }
}

impl AgentApi for FakeAgent {
    fn status(&self) -> AgentFuture<'_, StatusSnapshot> {
        Box::pin(async move {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.status_gate.pass().await;
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            let status = self.status.lock().unwrap().clone();
            status.map_err(|code| AgentError::Api {
                status: code,
                body: "fake failure".into(),
            })
        })
    }

    fn run<'a>(&'a self, kind: &'a ActionKind) -> AgentFuture<'a, RawResponse> {
        Box::pin(async move {
            self.actions.lock().unwrap().push(kind.clone());
            self.action_gate.pass().await;
            let response = self.action_response.lock().unwrap().clone();
            response.ok_or_else(transport_error)
        })
    }
}

/// Stand-in for a transport failure; `reqwest::Error` has no public constructor.
fn transport_error() -> AgentError {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    AgentError::Json(err)
}

#[derive(Default)]
pub(crate) struct FakeFrontend {
    next_id: AtomicU64,
    renders: Mutex<Vec<(String, PanelView)>>,
    edits: Mutex<Vec<(PanelHandle, PanelView)>>,
    deletes: Mutex<Vec<PanelHandle>>,
    render_err: Mutex<Option<FrontendError>>,
    edit_err: Mutex<Option<FrontendError>>,
    delete_err: Mutex<Option<FrontendError>>,
}

impl FakeFrontend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next_render(&self, err: FrontendError) {
        *self.render_err.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_edit(&self, err: FrontendError) {
        *self.edit_err.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_delete(&self, err: FrontendError) {
        *self.delete_err.lock().unwrap() = Some(err);
    }

    pub(crate) fn renders(&self) -> Vec<(String, PanelView)> {
        self.renders.lock().unwrap().clone()
    }

    pub(crate) fn edits(&self) -> Vec<(PanelHandle, PanelView)> {
        self.edits.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<PanelHandle> {
        self.deletes.lock().unwrap().clone()
    }
}

impl Frontend for FakeFrontend {
    fn render<'a>(
        &'a self,
        channel_id: &'a str,
        view: &'a PanelView,
    ) -> FrontendFuture<'a, PanelHandle> {
        Box::pin(async move {
            self.renders
                .lock()
                .unwrap()
                .push((channel_id.to_string(), view.clone()));
            if let Some(err) = self.render_err.lock().unwrap().take() {
                return Err(err);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(PanelHandle::new(channel_id, id.to_string()))
        })
    }

    fn edit<'a>(&'a self, handle: &'a PanelHandle, view: &'a PanelView) -> FrontendFuture<'a, ()> {
        Box::pin(async move {
            self.edits
                .lock()
                .unwrap()
                .push((handle.clone(), view.clone()));
            match self.edit_err.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }

    fn delete<'a>(&'a self, handle: &'a PanelHandle) -> FrontendFuture<'a, ()> {
        Box::pin(async move {
            self.deletes.lock().unwrap().push(handle.clone());
            match self.delete_err.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// A reconciler over fresh fakes reporting `snapshot`.
pub(crate) fn reconciler_with(
    snapshot: StatusSnapshot,
) -> (Arc<FakeAgent>, Arc<FakeFrontend>, Reconciler) {
    let agent = Arc::new(FakeAgent::new(snapshot));
    let frontend = Arc::new(FakeFrontend::new());
    let reconciler = Reconciler::new(
        StateFetcher::new(Arc::clone(&agent) as Arc<dyn AgentApi>),
        Arc::clone(&frontend) as Arc<dyn Frontend>,
    );
    (agent, frontend, reconciler)
}
