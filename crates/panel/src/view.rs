//! Snapshot → panel view.
//!
//! [`build`] is pure: the same snapshot always yields the same body and the
//! same ordered button list. Buttons are data (label, style, action); the
//! front end decides how to draw them.

use hostpanel_protocol::{ActionKind, Health, PanelAction, ServiceState, StatusSnapshot};

const TITLE: &str = "Server Status";
const DESCRIPTION: &str = "Current status of the servers";
const HOST_FIELD: &str = "PC Server";

/// Visual category of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    /// Start-class actions.
    Success,
    /// Stop-class actions.
    Danger,
    /// Neutral actions (refresh).
    Secondary,
}

/// One `name: value` line of the panel body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Embed-like panel body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelBody {
    pub title: String,
    pub description: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelButton {
    pub action: PanelAction,
    pub label: String,
    pub style: ButtonStyle,
}

impl PanelButton {
    fn new(action: PanelAction, style: ButtonStyle) -> Self {
        Self {
            label: action.label(),
            action,
            style,
        }
    }

    pub fn custom_id(&self) -> String {
        self.action.custom_id()
    }
}

/// Everything needed to draw the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub body: PanelBody,
    pub actions: Vec<PanelButton>,
}

/// Builds the panel for `snapshot`.
///
/// Buttons: one host action, one action per service in snapshot order, then
/// `Refresh`. Each entity only ever offers the direction that makes sense
/// for its current state.
pub fn build(snapshot: &StatusSnapshot) -> PanelView {
    let mut fields = Vec::with_capacity(snapshot.service_count() + 1);
    let mut actions = Vec::with_capacity(snapshot.service_count() + 2);

    let host_health = if snapshot.host.online {
        Health::Healthy
    } else {
        Health::Unhealthy
    };
    fields.push(Field {
        name: HOST_FIELD.into(),
        value: status_text(host_health).into(),
    });
    actions.push(if snapshot.host.online {
        PanelButton::new(PanelAction::Control(ActionKind::PowerOff), ButtonStyle::Danger)
    } else {
        PanelButton::new(PanelAction::Control(ActionKind::PowerOn), ButtonStyle::Success)
    });

    for (name, state) in snapshot.services() {
        fields.push(Field {
            name: name.into(),
            value: service_text(state),
        });
        actions.push(service_button(name, state));
    }

    actions.push(PanelButton::new(PanelAction::Refresh, ButtonStyle::Secondary));

    PanelView {
        body: PanelBody {
            title: TITLE.into(),
            description: DESCRIPTION.into(),
            fields,
        },
        actions,
    }
}

fn service_button(name: &str, state: &ServiceState) -> PanelButton {
    if state.health == Health::Unhealthy {
        PanelButton::new(
            PanelAction::Control(ActionKind::ServiceStart(name.into())),
            ButtonStyle::Success,
        )
    } else {
        PanelButton::new(
            PanelAction::Control(ActionKind::ServiceStop(name.into())),
            ButtonStyle::Danger,
        )
    }
}

fn status_text(health: Health) -> &'static str {
    match health {
        Health::Healthy => "🟢 Online",
        Health::Starting => "🟡 Starting",
        Health::Unhealthy | Health::Unknown => "🔴 Offline",
    }
}

fn service_text(state: &ServiceState) -> String {
    format!(
        "{} · {}/{} players",
        status_text(state.health),
        state.players,
        state.max_players
    )
}
