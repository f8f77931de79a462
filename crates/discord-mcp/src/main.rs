use anyhow::Context;
use discord_mcp::{all_tools, serve_stdio, DiscordClient, DiscordConfig, DiscordHandle, McpServer};
use log_scan::PatternRegistry;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = DiscordConfig::from_env();
    config.validate().context("invalid configuration")?;

    let client = Arc::new(
        DiscordClient::new(config.api.clone(), config.timeout())
            .context("failed to build Discord HTTP client")?,
    );
    let registry = Arc::new(PatternRegistry::builtin().context("invalid built-in pattern")?);
    info!("Loaded {} cheat patterns", registry.len());

    let server = McpServer::discord();
    server
        .register_tools(all_tools(
            client.clone(),
            registry,
            DiscordHandle::new(client, config.default_guild_id),
        ))
        .await;
    info!(
        "{} v{} ready with {} tools",
        server.info().name,
        server.info().version,
        server.list_tools().await.len()
    );
    for category in server.list_categories().await {
        let count = server.list_tools_by_category(&category).await.len();
        debug!("{} tools: {}", category, count);
    }

    serve_stdio(&server).await.context("stdio transport failed")?;
    Ok(())
}
