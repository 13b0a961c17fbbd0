//! Discord REST client (API v10).
//!
//! Covers the handful of calls the panel needs: channel messages,
//! interaction callbacks and follow-ups, and guild command registration.

use std::time::Duration;

use hostpanel_panel::{Frontend, FrontendError, FrontendFuture, PanelHandle, PanelView};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::Error;
use crate::message;

pub const API_BASE: &str = "https://discord.com/api/v10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/hostpanel/hostpanel, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

#[derive(Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Authenticated Discord REST client.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestClient {
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        Self::with_base_url(token, API_BASE)
    }

    /// Client against a custom API root.
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Posts a message and returns its id.
    pub async fn create_message(&self, channel_id: &str, body: &Value) -> Result<String, Error> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let text = self.send(self.http.post(&url).json(body)).await?;
        let created: CreatedMessage = serde_json::from_str(&text)?;
        Ok(created.id)
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        body: &Value,
    ) -> Result<(), Error> {
        let url = format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url);
        self.send(self.http.patch(&url).json(body)).await?;
        Ok(())
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        let url = format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url);
        self.send(self.http.delete(&url)).await?;
        Ok(())
    }

    /// Answers an interaction. Must happen within three seconds of receipt.
    pub async fn respond(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        body: &Value,
    ) -> Result<(), Error> {
        let url = format!(
            "{}/interactions/{interaction_id}/{interaction_token}/callback",
            self.base_url
        );
        self.send(self.http.post(&url).json(body)).await?;
        Ok(())
    }

    /// Sends a follow-up message on an already answered interaction.
    pub async fn follow_up(
        &self,
        application_id: &str,
        interaction_token: &str,
        body: &Value,
    ) -> Result<(), Error> {
        let url = format!("{}/webhooks/{application_id}/{interaction_token}", self.base_url);
        self.send(self.http.post(&url).json(body)).await?;
        Ok(())
    }

    /// Replaces the guild's command set. Returns the number registered.
    pub async fn register_guild_commands(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &Value,
    ) -> Result<usize, Error> {
        let url = format!(
            "{}/applications/{application_id}/guilds/{guild_id}/commands",
            self.base_url
        );
        let text = self.send(self.http.put(&url).json(commands)).await?;
        let registered: Vec<Value> = serde_json::from_str(&text)?;
        Ok(registered.len())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, Error> {
        let resp = request
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            debug!(status = status.as_u16(), "discord request rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn frontend_error(err: Error) -> FrontendError {
    match err {
        Error::Api { status: 404, .. } => FrontendError::NotFound,
        Error::Api { status, body } => FrontendError::Rejected { status, body },
        other => FrontendError::Transport(other.to_string()),
    }
}

impl Frontend for RestClient {
    fn render<'a>(
        &'a self,
        channel_id: &'a str,
        view: &'a PanelView,
    ) -> FrontendFuture<'a, PanelHandle> {
        Box::pin(async move {
            let id = self
                .create_message(channel_id, &message::panel_message(view))
                .await
                .map_err(frontend_error)?;
            Ok(PanelHandle::new(channel_id, id))
        })
    }

    fn edit<'a>(&'a self, handle: &'a PanelHandle, view: &'a PanelView) -> FrontendFuture<'a, ()> {
        Box::pin(async move {
            self.edit_message(
                &handle.channel_id,
                &handle.message_id,
                &message::panel_message(view),
            )
            .await
            .map_err(frontend_error)
        })
    }

    fn delete<'a>(&'a self, handle: &'a PanelHandle) -> FrontendFuture<'a, ()> {
        Box::pin(async move {
            self.delete_message(&handle.channel_id, &handle.message_id)
                .await
                .map_err(frontend_error)
        })
    }
}
