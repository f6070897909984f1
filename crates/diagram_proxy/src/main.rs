use std::process::ExitCode;

use diagram_proxy::{router, AppState, ProxyConfig};
use mdflow::config::EnvConfig;

#[tokio::main]
async fn main() -> ExitCode {
    mdflow::logging::init(&EnvConfig::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "diagram proxy stopped");
            eprintln!("diagram_proxy: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProxyConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, model = %config.model, "diagram proxy listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
