//! Point-in-time status of the host and its services.

use indexmap::IndexMap;

use crate::messages::{ServiceStatus, StatusResponse};

/// Health of a service container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Health {
    Healthy,
    Starting,
    Unhealthy,
    Unknown,
}

impl Health {
    /// Maps the agent's health string. Anything unrecognised is `Unknown`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("healthy") => Self::Healthy,
            Some("starting") => Self::Starting,
            Some("unhealthy") => Self::Unhealthy,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostState {
    pub online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceState {
    pub health: Health,
    pub players: u32,
    pub max_players: u32,
}

impl ServiceState {
    pub fn new(health: Health, players: u32, max_players: u32) -> Self {
        Self {
            health,
            players,
            max_players,
        }
    }
}

impl From<ServiceStatus> for ServiceState {
    fn from(status: ServiceStatus) -> Self {
        Self {
            health: Health::from_wire(status.health.as_deref()),
            players: status.players,
            max_players: status.max_players,
        }
    }
}

/// Immutable status snapshot.
///
/// Equality is structural: host state plus every service entry, in order.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub host: HostState,
    services: IndexMap<String, ServiceState>,
}

// `IndexMap` equality ignores order; a reordered list redraws the panel.
impl PartialEq for StatusSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.services.iter().eq(other.services.iter())
    }
}

impl Eq for StatusSnapshot {}

impl StatusSnapshot {
    pub fn new(host: HostState) -> Self {
        Self {
            host,
            services: IndexMap::new(),
        }
    }

    /// The degraded value used when the agent cannot be reached: host
    /// offline, no services.
    pub fn unreachable() -> Self {
        Self::new(HostState { online: false })
    }

    /// Adds (or replaces) a service entry.
    pub fn with_service(mut self, name: impl Into<String>, state: ServiceState) -> Self {
        self.services.insert(name.into(), state);
        self
    }

    /// Services in the order the agent listed them.
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceState)> {
        self.services.iter().map(|(name, state)| (name.as_str(), state))
    }

    pub fn service(&self, name: &str) -> Option<&ServiceState> {
        self.services.get(name)
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl From<StatusResponse> for StatusSnapshot {
    fn from(resp: StatusResponse) -> Self {
        let online = resp.is_online();
        Self {
            host: HostState { online },
            services: resp
                .services
                .into_iter()
                .map(|(name, status)| (name, ServiceState::from(status)))
                .collect(),
        }
    }
}
