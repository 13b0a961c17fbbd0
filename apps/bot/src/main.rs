//! hostpanel bot entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting hostpanel bot");

    let config = config::Config::load()?;
    tracing::info!(
        agent = %config.agent.base_url,
        wake = %config.wake.base_url,
        guild = %config.discord.guild_id,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("bot shut down cleanly");
    Ok(())
}
