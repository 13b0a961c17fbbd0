//! Control agent client.
//!
//! Async HTTP client using `reqwest`. Every call is bounded by a per-request
//! timeout; nothing is retried.

use std::time::Duration;

use hostpanel_protocol::constants::{ACTION_TIMEOUT, STATUS_TIMEOUT};
use hostpanel_protocol::{ActionKind, StatusResponse};
use tracing::debug;

/// Errors from the agent client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Endpoints and timeouts for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the control agent, e.g. `http://10.0.0.5:6000`.
    pub agent_url: String,
    /// Base URL of the wake service, e.g. `http://10.0.0.2:8000`.
    pub wake_url: String,
    pub status_timeout: Duration,
    pub action_timeout: Duration,
}

impl ClientConfig {
    pub fn new(agent_url: impl Into<String>, wake_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            wake_url: wake_url.into(),
            status_timeout: STATUS_TIMEOUT,
            action_timeout: ACTION_TIMEOUT,
        }
    }
}

/// Status code and body of an action call, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Control agent and wake service client.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            config: ClientConfig {
                agent_url: config.agent_url.trim_end_matches('/').to_string(),
                wake_url: config.wake_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    /// Fetches `GET /status`. Non-200 responses are returned as [`Error::Api`].
    pub async fn status(&self) -> Result<StatusResponse, Error> {
        let url = format!("{}/status", self.config.agent_url);
        let resp = self
            .http
            .get(&url)
            .timeout(self.config.status_timeout)
            .send()
            .await?;
        let status = resp.status();

        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Performs the single remote call behind `kind`.
    ///
    /// Any HTTP response, successful or not, is returned as a [`RawResponse`];
    /// only transport failures are errors.
    pub async fn run(&self, kind: &ActionKind) -> Result<RawResponse, Error> {
        let request = match kind {
            ActionKind::PowerOn => self.post(&self.config.wake_url, "/wake"),
            ActionKind::PowerOff => self.post(&self.config.agent_url, "/pc/shutdown"),
            ActionKind::PowerRestart => self.post(&self.config.agent_url, "/pc/reboot"),
            ActionKind::ServiceStart(name) => self
                .post(&self.config.agent_url, "/mc/start")
                .query(&[("name", name)]),
            ActionKind::ServiceStop(name) => self
                .post(&self.config.agent_url, "/mc/stop")
                .query(&[("name", name)]),
            ActionKind::ServiceRestart(name) => self
                .post(&self.config.agent_url, "/mc/restart")
                .query(&[("name", name)]),
        };

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        debug!(action = %kind, status, "action call finished");

        Ok(RawResponse { status, body })
    }

    fn post(&self, base: &str, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{base}{path}"))
            .timeout(self.config.action_timeout)
    }
}
