//! Recovery from panels deleted behind our back.
//!
//! Every outward edit or delete goes through [`LifecycleGuard`]. A
//! `NotFound` from the front end means somebody removed the message: the
//! store is cleared and the caller gets [`GuardOutcome::Vanished`] instead of
//! an error.

use tracing::info;

use crate::frontend::{Frontend, FrontendError, PanelHandle};
use crate::store::PanelState;
use crate::view::PanelView;

/// Result of a guarded call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Done,
    /// The target no longer existed; the store has been cleared.
    Vanished,
}

pub struct LifecycleGuard<'a> {
    frontend: &'a dyn Frontend,
}

impl<'a> LifecycleGuard<'a> {
    pub fn new(frontend: &'a dyn Frontend) -> Self {
        Self { frontend }
    }

    pub async fn edit(
        &self,
        state: &mut PanelState,
        handle: &PanelHandle,
        view: &PanelView,
    ) -> Result<GuardOutcome, FrontendError> {
        let result = self.frontend.edit(handle, view).await;
        Self::settle(state, handle, result)
    }

    pub async fn delete(
        &self,
        state: &mut PanelState,
        handle: &PanelHandle,
    ) -> Result<GuardOutcome, FrontendError> {
        let result = self.frontend.delete(handle).await;
        Self::settle(state, handle, result)
    }

    fn settle(
        state: &mut PanelState,
        handle: &PanelHandle,
        result: Result<(), FrontendError>,
    ) -> Result<GuardOutcome, FrontendError> {
        match result {
            Ok(()) => Ok(GuardOutcome::Done),
            Err(FrontendError::NotFound) => {
                info!(panel = %handle, "panel message is gone, forgetting it");
                state.clear();
                Ok(GuardOutcome::Vanished)
            }
            Err(e) => Err(e),
        }
    }
}
