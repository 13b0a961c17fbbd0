//! Discord front end for the control panel.
//!
//! [`RestClient`] implements the panel's `Frontend` seam over the REST API;
//! [`Gateway`] delivers interactions (slash commands and button presses)
//! over the WebSocket gateway.

mod error;
pub mod gateway;
pub mod interaction;
pub mod message;
mod pumps;
pub(crate) mod reconnection;
pub mod rest;
pub mod types;

pub use error::Error;
pub use gateway::Gateway;
pub use interaction::{CommandRequest, Interaction, InteractionKind, command_definitions};
pub use rest::RestClient;
pub use types::{GatewayConfig, GatewayEvent, ReconnectConfig};
