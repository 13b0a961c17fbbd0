//! The single active panel and the snapshot it currently shows.

use hostpanel_protocol::StatusSnapshot;
use tokio::sync::{Mutex, MutexGuard};

use crate::frontend::PanelHandle;

/// Identity of the active panel and what it was last rendered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub target: Option<PanelHandle>,
    pub last_rendered: Option<StatusSnapshot>,
}

impl PanelState {
    /// Swaps in a freshly rendered panel. Returns the previous target.
    pub fn replace(&mut self, target: PanelHandle, snapshot: StatusSnapshot) -> Option<PanelHandle> {
        let previous = self.target.replace(target);
        self.last_rendered = Some(snapshot);
        previous
    }

    /// Records `snapshot` unless it equals the last rendered one.
    ///
    /// Returns `false` (and changes nothing) when the snapshot is unchanged.
    pub fn update_if_changed(&mut self, snapshot: &StatusSnapshot) -> bool {
        if self.last_rendered.as_ref() == Some(snapshot) {
            return false;
        }
        self.last_rendered = Some(snapshot.clone());
        true
    }

    /// Forgets the panel; the next explicit status request creates a new one.
    pub fn clear(&mut self) {
        self.target = None;
        self.last_rendered = None;
    }

    /// Takes over an existing panel message when none is tracked.
    ///
    /// The last snapshot is dropped so the next pass redraws the message.
    pub fn adopt(&mut self, target: PanelHandle) -> bool {
        if self.target.is_some() {
            return false;
        }
        self.target = Some(target);
        self.last_rendered = None;
        true
    }
}

/// Exclusive lock over [`PanelState`] held for a whole reconciliation pass.
pub type PanelLock<'a> = MutexGuard<'a, PanelState>;

/// Process-wide owner of [`PanelState`]. All access is serialised.
#[derive(Debug, Default)]
pub struct PanelStore {
    state: Mutex<PanelState>,
}

impl PanelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state.
    pub async fn current(&self) -> PanelState {
        self.state.lock().await.clone()
    }

    /// Waits for exclusive access.
    pub async fn lock(&self) -> PanelLock<'_> {
        self.state.lock().await
    }

    /// Exclusive access if nobody else holds it.
    pub fn try_lock(&self) -> Option<PanelLock<'_>> {
        self.state.try_lock().ok()
    }
}
