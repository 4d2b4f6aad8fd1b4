//! Configuration resolution for revu-ingest
//!
//! Each setting is resolved independently: CLI flag → environment variable
//! (both through clap) → TOML file → compiled default. The JWT secret has no
//! default; the service refuses to start without one.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use revu_common::config::{find_config_file, load_toml_config, TomlConfig};
use revu_common::{Error, Result};
use tracing::info;

/// Service name used for the config file lookup
pub const SERVICE_NAME: &str = "revu-ingest";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_ANALYSIS_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TASK_RETENTION_SECS: u64 = 30 * 60;
pub const DEFAULT_PROGRESS_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_MAX_FILES: usize = 10;
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Multipart framing and the mappings field on top of the file payloads
const REQUEST_BODY_OVERHEAD: usize = 1024 * 1024;

/// Command-line arguments for revu-ingest
#[derive(Parser, Debug, Default)]
#[command(name = "revu-ingest")]
#[command(about = "Review file ingestion and analysis progress service")]
#[command(version)]
pub struct CliArgs {
    /// TOML config file (default: <config_dir>/revu/revu-ingest.toml)
    #[arg(short, long, env = "REVU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "REVU_BIND")]
    pub bind: Option<String>,

    /// sqlx SQLite URL
    #[arg(long, env = "REVU_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the remote analysis service
    #[arg(long, env = "REVU_ANALYSIS_URL")]
    pub analysis_url: Option<String>,

    /// HMAC secret for bearer tokens
    #[arg(long, env = "REVU_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Seconds an upload task is kept after creation
    #[arg(long, env = "REVU_TASK_RETENTION_SECS")]
    pub task_retention_secs: Option<u64>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub analysis_base_url: String,
    pub jwt_secret: String,
    pub task_retention: Duration,
    pub progress_poll_interval: Duration,
    pub max_files: usize,
    pub max_file_size: usize,
    pub cors_origins: Vec<String>,
}

impl ServiceConfig {
    /// Defaults everywhere except the secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            database_url: default_database_url(),
            analysis_base_url: DEFAULT_ANALYSIS_BASE_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            task_retention: Duration::from_secs(DEFAULT_TASK_RETENTION_SECS),
            progress_poll_interval: Duration::from_millis(DEFAULT_PROGRESS_POLL_INTERVAL_MS),
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }

    /// Load the TOML file (if any) and resolve against the CLI arguments
    pub fn load(args: &CliArgs) -> Result<Self> {
        let config_path = match &args.config {
            Some(path) => Some(path.clone()),
            None => find_config_file(SERVICE_NAME),
        };

        let toml_config = match config_path {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                load_toml_config(&path)?
            }
            None => TomlConfig::default(),
        };

        Self::resolve(args, &toml_config)
    }

    /// Merge CLI/env values over TOML values over defaults
    pub fn resolve(args: &CliArgs, toml: &TomlConfig) -> Result<Self> {
        let bind = args
            .bind
            .clone()
            .or_else(|| toml.bind_addr.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind, e)))?;

        let jwt_secret = args
            .jwt_secret
            .clone()
            .or_else(|| toml.jwt_secret.clone())
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "JWT secret not configured. Set REVU_JWT_SECRET, pass --jwt-secret, \
                     or add jwt_secret to the config file"
                        .to_string(),
                )
            })?;

        let max_files = toml.max_files.unwrap_or(DEFAULT_MAX_FILES);
        let max_file_size = toml.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);
        if max_files == 0 || max_file_size == 0 {
            return Err(Error::Config(
                "max_files and max_file_size must be greater than zero".to_string(),
            ));
        }

        let cors_origins = toml
            .cors_origins
            .clone()
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        Ok(Self {
            bind_addr,
            database_url: args
                .database_url
                .clone()
                .or_else(|| toml.database_url.clone())
                .unwrap_or_else(default_database_url),
            analysis_base_url: args
                .analysis_url
                .clone()
                .or_else(|| toml.analysis_base_url.clone())
                .unwrap_or_else(|| DEFAULT_ANALYSIS_BASE_URL.to_string()),
            jwt_secret,
            task_retention: Duration::from_secs(
                args.task_retention_secs
                    .or(toml.task_retention_secs)
                    .unwrap_or(DEFAULT_TASK_RETENTION_SECS),
            ),
            progress_poll_interval: Duration::from_millis(
                toml.progress_poll_interval_ms
                    .unwrap_or(DEFAULT_PROGRESS_POLL_INTERVAL_MS)
                    .max(1),
            ),
            max_files,
            max_file_size,
            cors_origins,
        })
    }

    /// Upper bound for a whole upload request body
    pub fn max_request_body(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(REQUEST_BODY_OVERHEAD)
    }
}

/// SQLite file in the OS data folder
pub fn default_database_url() -> String {
    let path = revu_common::config::default_data_dir().join("revu.db");
    format!("sqlite://{}", path.display())
}
