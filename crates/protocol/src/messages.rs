//! JSON bodies exchanged with the control agent and the wake service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::SERVER_ONLINE;

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub server: String,
    /// Services in the agent's configured order.
    #[serde(default)]
    pub services: IndexMap<String, ServiceStatus>,
}

impl StatusResponse {
    /// Returns `true` if the agent reports the host as online.
    pub fn is_online(&self) -> bool {
        self.server == SERVER_ONLINE
    }
}

/// Per-service entry of the status body.
///
/// `health` is the container health string (`healthy`, `starting`,
/// `unhealthy`) or `null` when the agent could not determine it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub max_players: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body returned by every action endpoint (`/mc/*`, `/pc/*`, `/wake`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
