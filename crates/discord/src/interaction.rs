//! Incoming interactions and the slash commands that produce them.

use hostpanel_panel::PanelHandle;
use hostpanel_protocol::ActionKind;
use serde::Deserialize;
use serde_json::{Value, json};

const INTERACTION_COMMAND: u8 = 2;
const INTERACTION_COMPONENT: u8 = 3;

const OPTION_SUB_COMMAND: u8 = 1;
const OPTION_STRING: u8 = 3;

/// What a slash command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    /// `/status`: post a fresh panel.
    Status,
    /// `/pc ...` and `/mc ...`.
    Action(ActionKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    Command(CommandRequest),
    /// A button on a panel message.
    Component {
        custom_id: String,
        message: PanelHandle,
    },
    /// Anything this bot does not handle; carries a reason for the reply.
    Unsupported(String),
}

/// An interaction ready to be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    pub token: String,
    pub channel_id: Option<String>,
    pub kind: InteractionKind,
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    id: String,
    application_id: String,
    #[serde(rename = "type")]
    kind: u8,
    token: String,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    name: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    channel_id: String,
}

impl Interaction {
    /// Parses the `d` payload of an `INTERACTION_CREATE` dispatch.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawInteraction = serde_json::from_value(value)?;
        let data = raw.data.unwrap_or_default();

        let kind = match raw.kind {
            INTERACTION_COMMAND => match parse_command(&data) {
                Ok(request) => InteractionKind::Command(request),
                Err(reason) => InteractionKind::Unsupported(reason),
            },
            INTERACTION_COMPONENT => match (data.custom_id, raw.message) {
                (Some(custom_id), Some(msg)) => InteractionKind::Component {
                    custom_id,
                    message: PanelHandle::new(msg.channel_id, msg.id),
                },
                _ => InteractionKind::Unsupported("component without message".into()),
            },
            other => InteractionKind::Unsupported(format!("interaction type {other}")),
        };

        Ok(Self {
            id: raw.id,
            application_id: raw.application_id,
            token: raw.token,
            channel_id: raw.channel_id,
            kind,
        })
    }
}

fn parse_command(data: &RawData) -> Result<CommandRequest, String> {
    let name = data.name.as_deref().unwrap_or_default();
    if name == "status" {
        return Ok(CommandRequest::Status);
    }

    let sub = data
        .options
        .first()
        .ok_or_else(|| format!("/{name} needs a subcommand"))?;

    let kind = match (name, sub.name.as_str()) {
        ("pc", "start") => ActionKind::PowerOn,
        ("pc", "shutdown") => ActionKind::PowerOff,
        ("pc", "restart") => ActionKind::PowerRestart,
        ("mc", verb) => {
            let service = sub
                .options
                .iter()
                .find(|o| o.name == "name")
                .and_then(|o| o.value.as_ref())
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| format!("/mc {verb} needs a server name"))?
                .to_string();
            match verb {
                "start" => ActionKind::ServiceStart(service),
                "stop" => ActionKind::ServiceStop(service),
                "restart" => ActionKind::ServiceRestart(service),
                _ => return Err(format!("unknown command /mc {verb}")),
            }
        }
        (name, verb) => return Err(format!("unknown command /{name} {verb}")),
    };
    Ok(CommandRequest::Action(kind))
}

fn subcommand(name: &str, description: &str, options: Value) -> Value {
    json!({
        "type": OPTION_SUB_COMMAND,
        "name": name,
        "description": description,
        "options": options,
    })
}

/// Guild command set for bulk registration.
pub fn command_definitions() -> Value {
    let service_name = json!([{
        "type": OPTION_STRING,
        "name": "name",
        "description": "Minecraft server name",
        "required": true,
    }]);

    json!([
        {
            "name": "status",
            "description": "Get the current status of the server",
        },
        {
            "name": "pc",
            "description": "PC server controls",
            "options": [
                subcommand("start", "Start the PC server", json!([])),
                subcommand("shutdown", "Shut down the PC server", json!([])),
                subcommand("restart", "Restart the PC server", json!([])),
            ],
        },
        {
            "name": "mc",
            "description": "Minecraft server controls",
            "options": [
                subcommand("start", "Start a Minecraft server", service_name.clone()),
                subcommand("stop", "Stop a Minecraft server", service_name.clone()),
                subcommand("restart", "Restart a Minecraft server", service_name),
            ],
        },
    ])
}
