//! Bot runtime - webhook server with graceful shutdown.

use tokio::net::TcpListener;
use tracing::info;

use super::dispatcher::AppState;
use super::webhook;
use crate::config::Config;

/// Serve the event webhook until Ctrl+C or SIGTERM.
pub async fn run(config: &Config, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("📡 Listening for OneBot events on http://{}", listener.local_addr()?);

    axum::serve(listener, webhook::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Welcome plugin unloaded");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
