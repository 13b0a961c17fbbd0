use std::time::Duration;

/// Upper bound for a single status fetch against the control agent.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single mutating call (power or service action).
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the background loop reconciles the panel.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Wait after a start/stop-class action before trusting a fresh status.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Wait after a restart-class action before trusting a fresh status.
pub const RESTART_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Value of the status endpoint's `server` field when the host is up.
pub const SERVER_ONLINE: &str = "online";

/// Maximum length of a button custom id accepted by chat front ends.
pub const CUSTOM_ID_MAX_LEN: usize = 100;

/// Custom id of the always-present refresh button.
pub const REFRESH_ID: &str = "refresh";
