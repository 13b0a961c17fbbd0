//! Wire protocol and shared domain types for hostpanel.
//!
//! Covers the JSON bodies exchanged with the control agent, the immutable
//! [`StatusSnapshot`] the panel is reconciled against, and the closed set of
//! [`ActionKind`]s an operator can trigger.

pub mod action;
pub mod constants;
pub mod messages;
pub mod snapshot;

// Re-export primary types for convenience.
pub use action::{ActionKind, ActionTarget, PanelAction, ParseActionError};
pub use messages::{ActionResponse, ServiceStatus, StatusResponse};
pub use snapshot::{Health, HostState, ServiceState, StatusSnapshot};
