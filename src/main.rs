//! Polling Chat Server - Entry Point
//!
//! Loads the optional snapshot, starts the ChatServer actor and the HTTP
//! listener, and saves a snapshot after shutdown.

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use polling_chat::{router, snapshot, ChatServer, Config, ServerHandle, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // e.g., RUST_LOG=debug or RUST_LOG=polling_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("polling_chat=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = if config.import {
        match snapshot::load(&config.data_dir).await {
            Ok(snapshot) => Store::from_snapshot(snapshot),
            Err(e) => {
                error!("Failed to import snapshot, starting empty: {}", e);
                Store::new()
            }
        }
    } else {
        info!("Skipped importing");
        Store::new()
    };

    let server = ChatServer::spawn(store, config.command_buffer);
    info!("ChatServer actor started");

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Chat server listening on {}", config.addr);

    axum::serve(listener, router(server.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    export(&config, &server).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Persist the final state; failures are only reported
async fn export(config: &Config, server: &ServerHandle) {
    let Some(mode) = config.export else {
        info!("Skipped exporting");
        return;
    };

    let snapshot = match server.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Could not take snapshot: {}", e);
            return;
        }
    };

    if let Err(e) = snapshot::save(&config.data_dir, snapshot, mode).await {
        error!("Failed to export snapshot: {}", e);
    }
}
