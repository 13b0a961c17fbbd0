//! Bot configuration.
//!
//! Stored as TOML at `~/.config/hostpanel/bot.toml`, or wherever
//! `HOSTPANEL_CONFIG` points. A missing file is created with defaults.
//! `DISCORD_TOKEN`, `HOSTPANEL_AGENT_URL` and `HOSTPANEL_WAKE_URL` override
//! the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hostpanel_agent_client::ClientConfig;
use hostpanel_panel::{PanelConfig, SettleDelays};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub wake: WakeConfig,
    #[serde(default)]
    pub panel: PanelSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied through `DISCORD_TOKEN` instead.
    #[serde(default)]
    pub token: String,

    /// Guild the slash commands are registered in.
    #[serde(default)]
    pub guild_id: String,

    /// Channel that gets a panel as soon as the bot connects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_url")]
    pub base_url: String,

    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,

    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeConfig {
    #[serde(default = "default_wake_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_settle")]
    pub settle_secs: u64,

    #[serde(default = "default_restart_settle")]
    pub restart_settle_secs: u64,
}

fn default_agent_url() -> String {
    "http://127.0.0.1:6000".into()
}

fn default_wake_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_status_timeout() -> u64 {
    5
}

fn default_action_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    30
}

fn default_settle() -> u64 {
    5
}

fn default_restart_settle() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_url(),
            status_timeout_secs: default_status_timeout(),
            action_timeout_secs: default_action_timeout(),
        }
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            base_url: default_wake_url(),
        }
    }
}

impl Default for PanelSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            settle_secs: default_settle(),
            restart_settle_secs: default_restart_settle(),
        }
    }
}

impl Config {
    /// Loads from the default location, applies environment overrides and
    /// validates.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, writing a default file there first if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            Ok(config)
        }
    }

    /// Writes the configuration, readable by the owner only.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies environment overrides; `lookup` is `std::env::var` in
    /// production. The token variable only fills an empty token.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.discord.token.trim().is_empty()
            && let Some(token) = set("DISCORD_TOKEN")
        {
            self.discord.token = token;
        }
        if let Some(url) = set("HOSTPANEL_AGENT_URL") {
            self.agent.base_url = url;
        }
        if let Some(url) = set("HOSTPANEL_WAKE_URL") {
            self.wake.base_url = url;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.discord.token.trim().is_empty() {
            anyhow::bail!("no Discord token: set DISCORD_TOKEN or [discord].token");
        }
        if self.discord.guild_id.trim().is_empty() {
            anyhow::bail!("no guild configured: set [discord].guild_id");
        }
        if self.panel.poll_interval_secs == 0 {
            anyhow::bail!("[panel].poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            status_timeout: Duration::from_secs(self.agent.status_timeout_secs),
            action_timeout: Duration::from_secs(self.agent.action_timeout_secs),
            ..ClientConfig::new(&self.agent.base_url, &self.wake.base_url)
        }
    }

    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            poll_interval: Duration::from_secs(self.panel.poll_interval_secs),
            status_timeout: Duration::from_secs(self.agent.status_timeout_secs),
            delays: SettleDelays {
                settle: Duration::from_secs(self.panel.settle_secs),
                restart: Duration::from_secs(self.panel.restart_settle_secs),
            },
        }
    }
}

/// `HOSTPANEL_CONFIG`, else `~/.config/hostpanel/bot.toml`.
fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("HOSTPANEL_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("hostpanel").join("bot.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("hostpanel")
            .join("bot.toml")
    }
}
