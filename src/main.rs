//! Luckydog Server
//!
//! Generates the commitment chain, publishes its commitment and serves
//! games over WebSocket. With `LUCKYDOG_SIMULATE=<games>` it prints a
//! simulation report for the fresh chain and exits instead.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use luckydog::{
    VERSION,
    chain::ChainConfig,
    game::FairEngine,
    network::{GameServer, ServerConfig},
};

/// Environment variable overriding the bind address.
const ENV_BIND_ADDR: &str = "LUCKYDOG_BIND_ADDR";
/// Environment variable selecting simulation mode.
const ENV_SIMULATE: &str = "LUCKYDOG_SIMULATE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Luckydog Server v{}", VERSION);

    let chain_config = ChainConfig::from_env().context("invalid chain configuration")?;
    info!(
        "Public seed: {} ({} games)",
        chain_config.public_seed,
        chain_config.game_capacity()
    );

    // Generation is CPU-bound and must finish before traffic is accepted.
    let engine = tokio::task::spawn_blocking(move || FairEngine::initialize(&chain_config))
        .await
        .context("chain generation task panicked")?
        .context("chain generation failed")?;

    let commitment = serde_json::to_string(engine.commitment())?;
    info!("Commitment: {}", commitment);

    if let Ok(games) = env::var(ENV_SIMULATE) {
        let games: usize = games
            .trim()
            .parse()
            .with_context(|| format!("{} must be a game count", ENV_SIMULATE))?;
        let report = engine.run_simulation(games)?;
        info!("{}", report);
        return Ok(());
    }

    let mut server_config = ServerConfig::default();
    if let Ok(addr) = env::var(ENV_BIND_ADDR) {
        server_config.bind_addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("{} is not a socket address: {}", ENV_BIND_ADDR, addr))?;
    }

    let server = Arc::new(GameServer::new(server_config, engine));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_server.shutdown(),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
