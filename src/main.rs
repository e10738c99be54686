use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use okey_server::core::ServerConfig;
use okey_server::{net, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env().context("reading OKEY_* configuration")?;
    info!(
        bind = %config.bind_addr,
        turn_seconds = config.turn_seconds,
        grace_secs = config.reconnect_grace_secs,
        seeded = config.seed.is_some(),
        "starting okey server"
    );

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    let handle = server::spawn(config);

    tokio::select! {
        result = net::serve(listener, handle) => result.context("accept loop failed")?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}
