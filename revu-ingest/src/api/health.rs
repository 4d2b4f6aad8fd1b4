//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok", or "degraded" when the database is unreachable)
    pub status: String,
    /// Module name ("revu-ingest")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Upload tasks currently held by the registry
    pub active_tasks: usize,
    /// Review database reachability ("ok" or "unavailable")
    pub database: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let database_ok = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            false
        }
    };

    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        module: "revu-ingest".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        active_tasks: state.registry.len().await,
        database: if database_ok { "ok" } else { "unavailable" }.to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
