//! Remote state source and control endpoint.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use hostpanel_agent_client::{Client, Error as AgentError, RawResponse};
use hostpanel_protocol::constants::STATUS_TIMEOUT;
use hostpanel_protocol::{ActionKind, StatusSnapshot};
use tracing::{debug, warn};

/// A boxed future returned by [`AgentApi`] calls.
pub type AgentFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AgentError>> + Send + 'a>>;

/// The control agent as the engine sees it.
pub trait AgentApi: Send + Sync + 'static {
    /// Current host and service state.
    fn status(&self) -> AgentFuture<'_, StatusSnapshot>;

    /// Performs the single remote call behind `kind`. Non-2xx responses are
    /// `Ok`; only transport failures are errors.
    fn run<'a>(&'a self, kind: &'a ActionKind) -> AgentFuture<'a, RawResponse>;
}

impl AgentApi for Client {
    fn status(&self) -> AgentFuture<'_, StatusSnapshot> {
        Box::pin(async move { Ok(StatusSnapshot::from(Client::status(self).await?)) })
    }

    fn run<'a>(&'a self, kind: &'a ActionKind) -> AgentFuture<'a, RawResponse> {
        Box::pin(Client::run(self, kind))
    }
}

/// Fetches snapshots, degrading every failure to
/// [`StatusSnapshot::unreachable`].
pub struct StateFetcher {
    agent: Arc<dyn AgentApi>,
    timeout: Duration,
}

impl StateFetcher {
    pub fn new(agent: Arc<dyn AgentApi>) -> Self {
        Self {
            agent,
            timeout: STATUS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails: an unreachable or misbehaving agent is a status fact.
    pub async fn fetch(&self) -> StatusSnapshot {
        match tokio::time::timeout(self.timeout, self.agent.status()).await {
            Ok(Ok(snapshot)) => {
                debug!(
                    online = snapshot.host.online,
                    services = snapshot.service_count(),
                    "status fetched"
                );
                snapshot
            }
            Ok(Err(e)) => {
                warn!(error = %e, "status fetch failed, treating host as unreachable");
                StatusSnapshot::unreachable()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "status fetch timed out, treating host as unreachable"
                );
                StatusSnapshot::unreachable()
            }
        }
    }
}
