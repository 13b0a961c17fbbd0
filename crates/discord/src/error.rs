use tokio_tungstenite::tungstenite;

/// Errors from the Discord REST client and gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("gateway protocol error: {0}")]
    Protocol(String),

    #[error("connection closed")]
    Closed,
}
