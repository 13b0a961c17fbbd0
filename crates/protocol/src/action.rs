//! Mutating actions and the button identifiers that carry them.

use std::fmt;
use std::str::FromStr;

use crate::constants::REFRESH_ID;

/// One remote call against the host or a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PowerOn,
    PowerOff,
    PowerRestart,
    ServiceStart(String),
    ServiceStop(String),
    ServiceRestart(String),
}

/// The entity an action mutates. At most one action per target runs at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionTarget {
    Host,
    Service(String),
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("the host"),
            Self::Service(name) => write!(f, "{name}"),
        }
    }
}

impl ActionKind {
    pub fn target(&self) -> ActionTarget {
        match self {
            Self::PowerOn | Self::PowerOff | Self::PowerRestart => ActionTarget::Host,
            Self::ServiceStart(name) | Self::ServiceStop(name) | Self::ServiceRestart(name) => {
                ActionTarget::Service(name.clone())
            }
        }
    }

    pub fn is_restart(&self) -> bool {
        matches!(self, Self::PowerRestart | Self::ServiceRestart(_))
    }

    /// Button label.
    pub fn label(&self) -> String {
        match self {
            Self::PowerOn => "Turn On PC".into(),
            Self::PowerOff => "Shutdown PC".into(),
            Self::PowerRestart => "Restart PC".into(),
            Self::ServiceStart(name) => format!("Start {name}"),
            Self::ServiceStop(name) => format!("Stop {name}"),
            Self::ServiceRestart(name) => format!("Restart {name}"),
        }
    }

    /// Immediate acknowledgement shown to whoever triggered the action.
    pub fn progress_message(&self) -> String {
        match self {
            Self::PowerOn => "Starting PC...".into(),
            Self::PowerOff => "Shutting down PC...".into(),
            Self::PowerRestart => "Restarting PC...".into(),
            Self::ServiceStart(name) => format!("Starting {name}..."),
            Self::ServiceStop(name) => format!("Stopping {name}..."),
            Self::ServiceRestart(name) => format!("Restarting {name}..."),
        }
    }

    /// Stable identifier used as a button custom id.
    pub fn custom_id(&self) -> String {
        match self {
            Self::PowerOn => "power:on".into(),
            Self::PowerOff => "power:off".into(),
            Self::PowerRestart => "power:restart".into(),
            Self::ServiceStart(name) => format!("service:start:{name}"),
            Self::ServiceStop(name) => format!("service:stop:{name}"),
            Self::ServiceRestart(name) => format!("service:restart:{name}"),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.custom_id())
    }
}

/// What a panel button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PanelAction {
    Control(ActionKind),
    Refresh,
}

/// Errors from parsing a button custom id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseActionError {
    #[error("unknown action id: {0}")]
    Unknown(String),

    #[error("missing service name in action id: {0}")]
    MissingService(String),
}

impl PanelAction {
    pub fn custom_id(&self) -> String {
        match self {
            Self::Control(kind) => kind.custom_id(),
            Self::Refresh => REFRESH_ID.into(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Control(kind) => kind.label(),
            Self::Refresh => "Refresh".into(),
        }
    }
}

impl FromStr for PanelAction {
    type Err = ParseActionError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let kind = match id {
            REFRESH_ID => return Ok(Self::Refresh),
            "power:on" => ActionKind::PowerOn,
            "power:off" => ActionKind::PowerOff,
            "power:restart" => ActionKind::PowerRestart,
            _ => {
                let rest = id
                    .strip_prefix("service:")
                    .ok_or_else(|| ParseActionError::Unknown(id.into()))?;
                let (verb, name) = rest
                    .split_once(':')
                    .ok_or_else(|| ParseActionError::Unknown(id.into()))?;
                if name.is_empty() {
                    return Err(ParseActionError::MissingService(id.into()));
                }
                match verb {
                    "start" => ActionKind::ServiceStart(name.into()),
                    "stop" => ActionKind::ServiceStop(name.into()),
                    "restart" => ActionKind::ServiceRestart(name.into()),
                    _ => return Err(ParseActionError::Unknown(id.into())),
                }
            }
        };
        Ok(Self::Control(kind))
    }
}
