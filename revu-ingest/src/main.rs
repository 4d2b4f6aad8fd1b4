//! revu-ingest - Review ingestion microservice
//!
//! Accepts review file uploads, normalizes and stores the reviews, optionally
//! triggers the remote analysis, and streams combined progress to browsers
//! over SSE.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revu_ingest::config::{CliArgs, ServiceConfig};
use revu_ingest::services::AnalysisClient;
use revu_ingest::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,revu_ingest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = ServiceConfig::load(&args).context("Failed to load configuration")?;

    info!("Starting revu-ingest (Review Ingest) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_url);
    info!("Analysis service: {}", config.analysis_base_url);

    let db_pool = revu_ingest::db::init_database_pool(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let analysis = AnalysisClient::new(config.analysis_base_url.clone())
        .context("Failed to build analysis client")?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(db_pool, config, analysis);
    let app = revu_ingest::build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
