//! Kafka admin API server.

use anyhow::{Context, Result};
use kafka_admin_api::{api, telemetry, AdminConfig, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AdminConfig::load().context("Failed to load configuration")?;

    telemetry::init(&config.log_level)?;

    info!(
        bootstrap = %config.kafka.bootstrap_servers,
        security_protocol = config.kafka.security_protocol.as_str(),
        timeout_secs = config.kafka.request_timeout_secs,
        "Starting Kafka admin API"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.address))?;

    let state = AppState::new(&config);
    let app = api::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Admin API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Admin API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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

    info!("Shutdown signal received");
}
