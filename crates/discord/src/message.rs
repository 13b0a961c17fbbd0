//! Discord message payloads: panel embeds, button rows, interaction replies.

use hostpanel_panel::{ButtonStyle, PanelButton, PanelView};
use hostpanel_protocol::constants::CUSTOM_ID_MAX_LEN;
use serde_json::{Value, json};
use tracing::warn;

/// Buttons per action row.
pub const ROW_WIDTH: usize = 5;
/// Action rows per message.
pub const MAX_ROWS: usize = 5;

/// Longest button label Discord accepts, in characters.
pub const LABEL_MAX_LEN: usize = 80;
/// Longest embed field name Discord accepts, in characters.
const FIELD_NAME_MAX_LEN: usize = 256;

const EMBED_COLOR: u32 = 0x5865F2;

const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;

/// Interaction callback type: reply with a message.
const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
const FLAG_EPHEMERAL: u64 = 64;

fn button_style(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with an ellipsis.
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// The button payload, or `None` when its custom id is too long to send.
///
/// Discord rejects the whole message over one oversized id, so such a button
/// is left off the panel; the service stays reachable through `/mc`.
fn button(b: &PanelButton) -> Option<Value> {
    let custom_id = b.custom_id();
    if custom_id.chars().count() > CUSTOM_ID_MAX_LEN {
        warn!(
            %custom_id,
            max = CUSTOM_ID_MAX_LEN,
            "button id too long for Discord, leaving it off the panel"
        );
        return None;
    }
    Some(json!({
        "type": COMPONENT_BUTTON,
        "style": button_style(b.style),
        "label": clip(&b.label, LABEL_MAX_LEN),
        "custom_id": custom_id,
    }))
}

/// Lays buttons out row-major, [`ROW_WIDTH`] per row.
///
/// Buttons whose id Discord would refuse are dropped first. A message holds
/// at most `ROW_WIDTH * MAX_ROWS` buttons; beyond that the trailing button
/// (refresh) is kept and the overflow before it dropped.
pub fn action_rows(buttons: &[PanelButton]) -> Vec<Value> {
    let sendable: Vec<Value> = buttons.iter().filter_map(button).collect();

    let capacity = ROW_WIDTH * MAX_ROWS;
    let kept: Vec<Value> = if sendable.len() > capacity {
        warn!(
            buttons = sendable.len(),
            capacity, "panel has more buttons than a message can hold, truncating"
        );
        let mut kept = sendable;
        let last = kept.pop();
        kept.truncate(capacity - 1);
        kept.extend(last);
        kept
    } else {
        sendable
    };

    kept.chunks(ROW_WIDTH)
        .map(|row| {
            json!({
                "type": COMPONENT_ACTION_ROW,
                "components": row,
            })
        })
        .collect()
}

/// Body for creating or editing the panel message.
pub fn panel_message(view: &PanelView) -> Value {
    let fields: Vec<Value> = view
        .body
        .fields
        .iter()
        .map(|f| {
            json!({
                "name": clip(&f.name, FIELD_NAME_MAX_LEN),
                "value": f.value,
                "inline": false,
            })
        })
        .collect();

    json!({
        "content": "",
        "embeds": [{
            "title": view.body.title,
            "description": view.body.description,
            "color": EMBED_COLOR,
            "fields": fields,
        }],
        "components": action_rows(&view.actions),
    })
}

/// Interaction callback carrying a plain text reply.
pub fn reply(content: &str, ephemeral: bool) -> Value {
    json!({
        "type": CALLBACK_CHANNEL_MESSAGE,
        "data": text(content, ephemeral),
    })
}

/// Follow-up webhook message body.
pub fn text(content: &str, ephemeral: bool) -> Value {
    let mut data = json!({ "content": content });
    if ephemeral {
        data["flags"] = json!(FLAG_EPHEMERAL);
    }
    data
}
