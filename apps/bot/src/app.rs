//! Wires the gateway, the REST front end and the panel engine together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hostpanel_agent_client::Client as AgentClient;
use hostpanel_discord::{
    CommandRequest, Gateway, GatewayConfig, GatewayEvent, Interaction, InteractionKind,
    RestClient, command_definitions, message,
};
use hostpanel_panel::{ActionOutcome, ControlPanel, Frontend, PressOutcome, ReconcileOutcome};
use hostpanel_protocol::PanelAction;

use crate::config::Config;

/// Discord caps message content at 2000 characters.
const MAX_CONTENT: usize = 2000;

/// Runs the bot until Ctrl-C or until the gateway gives up.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let rest = Arc::new(RestClient::new(config.discord.token.clone())?);
    let agent = Arc::new(AgentClient::new(config.client_config())?);
    let panel = Arc::new(ControlPanel::new(
        agent,
        Arc::clone(&rest) as Arc<dyn Frontend>,
        config.panel_config(),
    ));

    let bot = Arc::new(Bot {
        rest,
        panel: Arc::clone(&panel),
        guild_id: config.discord.guild_id.clone(),
        status_channel_id: config.discord.status_channel_id.clone(),
        commands_registered: AtomicBool::new(false),
        startup_panel_posted: AtomicBool::new(false),
    });

    let (gateway, mut events) = Gateway::start(GatewayConfig::new(config.discord.token.clone()));
    panel.start().await;
    tracing::info!("bot ready");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::error!("gateway stopped, shutting down");
                    break;
                };
                let bot = Arc::clone(&bot);
                tokio::spawn(async move { bot.handle(event).await });
            }
        }
    }

    tracing::info!("stopping services...");
    panel.shutdown().await;
    gateway.shutdown().await;
    Ok(())
}

struct Bot {
    rest: Arc<RestClient>,
    panel: Arc<ControlPanel>,
    guild_id: String,
    status_channel_id: Option<String>,
    commands_registered: AtomicBool,
    startup_panel_posted: AtomicBool,
}

impl Bot {
    async fn handle(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready {
                application_id,
                user,
                ..
            } => {
                tracing::info!(%user, "connected to Discord");
                self.on_ready(&application_id).await;
            }
            GatewayEvent::Interaction(interaction) => self.on_interaction(interaction).await,
            GatewayEvent::Disconnected => tracing::warn!("disconnected from Discord"),
            GatewayEvent::Reconnecting {
                attempt,
                next_retry_secs,
            } => {
                tracing::debug!(attempt, next_retry_secs, "gateway reconnect scheduled");
            }
        }
    }

    async fn on_ready(&self, application_id: &str) {
        if !self.commands_registered.swap(true, Ordering::SeqCst) {
            match self
                .rest
                .register_guild_commands(application_id, &self.guild_id, &command_definitions())
                .await
            {
                Ok(count) => tracing::info!(count, guild = %self.guild_id, "slash commands synced"),
                Err(e) => {
                    tracing::error!(error = %e, "failed to sync slash commands");
                    self.commands_registered.store(false, Ordering::SeqCst);
                }
            }
        }

        if let Some(channel) = &self.status_channel_id
            && !self.startup_panel_posted.swap(true, Ordering::SeqCst)
        {
            match self.panel.status(channel).await {
                Ok(handle) => tracing::info!(panel = %handle, "startup panel posted"),
                Err(e) => tracing::warn!(error = %e, "failed to post startup panel"),
            }
        }
    }

    async fn on_interaction(&self, interaction: Interaction) {
        match &interaction.kind {
            InteractionKind::Command(CommandRequest::Status) => {
                let Some(channel) = interaction.channel_id.clone() else {
                    self.reply(&interaction, "This command only works in a channel.", true)
                        .await;
                    return;
                };
                self.reply(&interaction, "Posting status panel...", true).await;
                if let Err(e) = self.panel.status(&channel).await {
                    self.follow_up(&interaction, &format!("Failed to post status panel: {e}"))
                        .await;
                }
            }
            InteractionKind::Command(CommandRequest::Action(kind)) => {
                self.reply(&interaction, &kind.progress_message(), false).await;
                let outcome = self.panel.act(kind.clone()).await;
                self.report(&interaction, &outcome).await;
            }
            InteractionKind::Component { custom_id, message } => {
                let action: PanelAction = match custom_id.parse() {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::warn!(%custom_id, error = %e, "unknown panel button");
                        self.reply(&interaction, "Unknown button.", true).await;
                        return;
                    }
                };
                self.reply(&interaction, &ack_text(&action), false).await;

                match self.panel.press(custom_id, message.clone()).await {
                    Ok(PressOutcome::Dispatched(outcome)) => {
                        self.report(&interaction, &outcome).await;
                    }
                    Ok(PressOutcome::Refreshed(ReconcileOutcome::Failed(e))) => {
                        self.follow_up(&interaction, &format!("Refresh failed: {e}")).await;
                    }
                    Ok(PressOutcome::Refreshed(_)) => {}
                    Err(e) => tracing::warn!(%custom_id, error = %e, "button press rejected"),
                }
            }
            InteractionKind::Unsupported(reason) => {
                tracing::debug!(%reason, "unsupported interaction");
                self.reply(&interaction, reason, true).await;
            }
        }
    }

    /// Sends the failure payload of `outcome`, if any, as a follow-up.
    async fn report(&self, interaction: &Interaction, outcome: &ActionOutcome) {
        if let Some(text) = failure_text(outcome) {
            self.follow_up(interaction, &text).await;
        }
    }

    async fn reply(&self, interaction: &Interaction, content: &str, ephemeral: bool) {
        let body = message::reply(&truncate(content), ephemeral);
        if let Err(e) = self
            .rest
            .respond(&interaction.id, &interaction.token, &body)
            .await
        {
            tracing::warn!(interaction = %interaction.id, error = %e, "failed to answer interaction");
        }
    }

    async fn follow_up(&self, interaction: &Interaction, content: &str) {
        let body = message::text(&truncate(content), true);
        if let Err(e) = self
            .rest
            .follow_up(&interaction.application_id, &interaction.token, &body)
            .await
        {
            tracing::warn!(interaction = %interaction.id, error = %e, "failed to send follow-up");
        }
    }
}

/// Immediate acknowledgement for a panel button.
fn ack_text(action: &PanelAction) -> String {
    match action {
        PanelAction::Refresh => "Refreshing...".into(),
        PanelAction::Control(kind) => kind.progress_message(),
    }
}

/// The raw payload of a failed action, or `None` on success.
fn failure_text(outcome: &ActionOutcome) -> Option<String> {
    if outcome.succeeded {
        return None;
    }
    if outcome.payload.trim().is_empty() {
        return Some(match outcome.status {
            Some(status) => format!("Action failed with HTTP {status}."),
            None => "Action failed.".into(),
        });
    }
    Some(outcome.payload.clone())
}

fn truncate(content: &str) -> String {
    content.chars().take(MAX_CONTENT).collect()
}
