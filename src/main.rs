// CmdShift Backend - HTTP server entry point

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use cmdshift_backend::storage::ConfigService;
use cmdshift_backend::utils::logging::init_tracing;
use cmdshift_backend::{AppState, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_service = ConfigService::new().context("failed to load configuration")?;
    let config = config_service.get_config_clone();
    tracing::info!(
        config_path = %config_service.config_path().display(),
        environment = ?config.environment,
        model = %config.provider.model,
        "configuration loaded"
    );

    let state = Arc::new(AppState::from_config(config).context("failed to initialize services")?);
    let server = Server::bind(state).await.context("failed to bind listener")?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl+C");
                signal.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for Ctrl+C"),
        }
    });

    server.run(shutdown).await.context("server failed")?;
    Ok(())
}
