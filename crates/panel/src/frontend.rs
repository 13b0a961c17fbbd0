//! Seam to the chat front end that draws the panel.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::view::PanelView;

/// Identity of a rendered panel message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanelHandle {
    pub channel_id: String,
    pub message_id: String,
}

impl PanelHandle {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}

impl fmt::Display for PanelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

/// Errors reported by a front end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontendError {
    /// The message (or its channel) no longer exists.
    #[error("panel message not found")]
    NotFound,

    #[error("front end rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("front end unreachable: {0}")]
    Transport(String),
}

/// A boxed future returned by front end calls.
pub type FrontendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FrontendError>> + Send + 'a>>;

/// Renders, edits and deletes panel messages.
///
/// `edit` and `delete` must report [`FrontendError::NotFound`] when the
/// handle no longer points at a live message.
pub trait Frontend: Send + Sync + 'static {
    /// Posts a new panel into `channel_id`.
    fn render<'a>(&'a self, channel_id: &'a str, view: &'a PanelView)
    -> FrontendFuture<'a, PanelHandle>;

    /// Replaces body and buttons of an existing panel.
    fn edit<'a>(&'a self, handle: &'a PanelHandle, view: &'a PanelView) -> FrontendFuture<'a, ()>;

    fn delete<'a>(&'a self, handle: &'a PanelHandle) -> FrontendFuture<'a, ()>;
}
