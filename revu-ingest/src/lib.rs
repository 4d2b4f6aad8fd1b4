//! revu-ingest library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::ServiceConfig;
pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::{AnalysisClient, IngestionOrchestrator, TaskRegistry};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Review database
    pub db: SqlitePool,
    /// Upload task state, shared with background tasks
    pub registry: TaskRegistry,
    /// Pipeline spawned once per upload
    pub orchestrator: IngestionOrchestrator,
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ServiceConfig, analysis: AnalysisClient) -> Self {
        let registry = TaskRegistry::new();
        let orchestrator = IngestionOrchestrator::new(db.clone(), registry.clone(), analysis);
        Self {
            db,
            registry,
            orchestrator,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(api::upload_routes(state.config.max_request_body()))
        .merge(api::progress_routes())
        .merge(api::health_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
