//! Control panel engine.
//!
//! Keeps exactly one rendered panel consistent with the control agent's
//! reported state. Three kinds of trigger feed the [`Reconciler`]: the
//! periodic [`Scheduler`], explicit status requests, and the delayed pass the
//! [`ActionDispatcher`] schedules after every mutating action. All passes
//! serialise through the [`PanelStore`].

pub mod dispatcher;
pub mod frontend;
pub mod guard;
pub mod panel;
pub mod reconciler;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{ActionDispatcher, ActionOutcome, SettleDelays};
pub use frontend::{Frontend, FrontendError, FrontendFuture, PanelHandle};
pub use guard::{GuardOutcome, LifecycleGuard};
pub use panel::{ControlPanel, PanelConfig, PressOutcome};
pub use reconciler::{ReconcileOutcome, Reconciler, Trigger};
pub use scheduler::Scheduler;
pub use source::{AgentApi, AgentFuture, StateFetcher};
pub use store::{PanelLock, PanelState, PanelStore};
pub use view::{ButtonStyle, Field, PanelBody, PanelButton, PanelView};
