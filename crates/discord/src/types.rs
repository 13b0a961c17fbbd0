//! Gateway payloads, events and connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::interaction::Interaction;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// `GUILDS`; interactions are delivered regardless of intents.
pub const INTENTS_GUILDS: u64 = 1;

/// Gateway opcodes.
pub mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Close codes after which reconnecting cannot help (bad token, intents,
/// API version or sharding).
pub const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

/// One gateway frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    pub fn heartbeat(last_seq: Option<u64>) -> Self {
        Self {
            op: op::HEARTBEAT,
            d: json!(last_seq),
            s: None,
            t: None,
        }
    }

    pub fn identify(token: &str, intents: u64) -> Self {
        Self {
            op: op::IDENTIFY,
            d: json!({
                "token": token,
                "intents": intents,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "hostpanel",
                    "device": "hostpanel",
                },
            }),
            s: None,
            t: None,
        }
    }
}

/// Events surfaced to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Ready {
        application_id: String,
        session_id: String,
        user: String,
    },
    Interaction(Interaction),
    Disconnected,
    Reconnecting { attempt: u32, next_retry_secs: f64 },
}

/// Configuration for automatic reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Initial delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculates the delay for a given attempt number (1-based),
    /// with ±25% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        let jitter = capped * 0.25;
        let offset = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64
            / u32::MAX as f64)
            * 2.0
            - 1.0; // [-1.0, 1.0)
        let with_jitter = (capped + jitter * offset).max(0.05);
        Duration::from_secs_f64(with_jitter)
    }
}

/// Gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub token: String,
    pub intents: u64,
    pub reconnect: ReconnectConfig,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            url: GATEWAY_URL.into(),
            token: token.into(),
            intents: INTENTS_GUILDS,
            reconnect: ReconnectConfig::default(),
        }
    }
}
