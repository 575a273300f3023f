use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mq::NotificationPublisher;
use tokio::signal;
use tracing::{error, info};

use trace_server::config::AppConfig;
use trace_server::database::init_db;
use trace_server::pipeline::reconcile::run_orphan_scanner;
use trace_server::state::AppState;
use trace_server::store::{SeaOrmIdentityStore, SeaOrmMetadataStore};
use trace_server::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let telemetry = init_tracing(&config.telemetry)?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected and schema synced");

    let metadata = Arc::new(SeaOrmMetadataStore::new(db.clone()));
    let identities = Arc::new(SeaOrmIdentityStore::new(db));
    let objects = common::storage::connect(&config.storage)
        .await
        .context("Failed to initialise object store")?;
    let notifier = Arc::new(NotificationPublisher::connect(&config.notification).await);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let scan_interval = config.storage.orphan_scan_interval_secs;
    let state = AppState::new(
        config,
        metadata,
        identities,
        objects,
        Arc::clone(&notifier),
    );

    if scan_interval > 0 {
        tokio::spawn(run_orphan_scanner(
            Arc::clone(&state.metadata),
            Arc::clone(&state.objects),
            Duration::from_secs(scan_interval),
        ));
    }
    let app = trace_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr} (API docs at /scalar)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    notifier.shutdown().await;
    telemetry.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
