use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use schedule_server::config::ServerConfig;
use schedule_server::store::{MemoryStore, SnapshotFile};
use schedule_server::vstp::{StompSource, VstpConsumer};
use schedule_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "server exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    // Start from the last snapshot so queries work before the feed loads
    let store = match config.snapshot_path.as_ref() {
        Some(path) => match SnapshotFile::new(path).load().await {
            Ok(Some(snapshot)) => MemoryStore::from_snapshot(snapshot),
            Ok(None) => MemoryStore::new(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable snapshot");
                MemoryStore::new()
            }
        },
        None => MemoryStore::new(),
    };
    let store = Arc::new(store);
    let state = AppState::new(store.clone(), &config);

    if let Some(guard) = state.pipeline.try_acquire() {
        state.spawn_refresh(guard);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = match config.stomp_config() {
        Some(stomp) => {
            info!(address = %stomp.address, "VSTP consumer enabled");
            let consumer = VstpConsumer::new(StompSource::new(stomp), store.clone());
            Some(tokio::spawn(consumer.run(shutdown_rx)))
        }
        None => {
            info!("STOMP_URL is empty, VSTP consumer disabled");
            None
        }
    };

    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(config.listen_on).await?;
    info!(address = %config.listen_on, "serving schedules");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(consumer) = consumer
        && let Err(e) = consumer.await
    {
        warn!(error = %e, "VSTP consumer task failed");
    }

    state.save_snapshot().await?;
    Ok(())
}
