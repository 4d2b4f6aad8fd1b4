//! Router-level test utilities
//!
//! Builds the full application over a temp database, signs bearer tokens,
//! encodes multipart bodies and decodes SSE bodies.

use std::time::Duration;

use axum::Router;
use http_body_util::BodyExt;
use revu_common::api::issue_token;
use revu_common::events::TaskProgressEvent;
use revu_ingest::services::AnalysisClient;
use revu_ingest::{build_router, AppState, ServiceConfig};
use sqlx::SqlitePool;
use tempfile::TempDir;

use super::db_utils::create_test_db;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Application under test; keep `_temp_dir` alive for the whole test
pub struct TestApp {
    pub _temp_dir: TempDir,
    pub db: SqlitePool,
    pub state: AppState,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}

/// Config with fast polling for tests
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::new(TEST_SECRET);
    config.progress_poll_interval = Duration::from_millis(20);
    config
}

/// Build the app with the given config and analysis base URL
pub async fn create_test_app(config: ServiceConfig, analysis_url: &str) -> TestApp {
    let (temp_dir, db) = create_test_db().await.unwrap();
    let analysis = AnalysisClient::new(analysis_url).unwrap();
    let state = AppState::new(db.clone(), config, analysis);
    TestApp {
        _temp_dir: temp_dir,
        db,
        state,
    }
}

/// `Authorization` header value for `user_id`
pub fn bearer(user_id: i64) -> String {
    format!("Bearer {}", issue_token(user_id, TEST_SECRET, 3600).unwrap())
}

/// Minimal multipart/form-data encoder
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "revu-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Read an SSE response body to its end and decode every `data:` frame
pub async fn collect_sse_events(body: axum::body::Body) -> Vec<TaskProgressEvent> {
    let bytes = tokio::time::timeout(Duration::from_secs(10), body.collect())
        .await
        .expect("SSE stream did not close")
        .unwrap()
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    text.split("\n\n")
        .filter_map(|frame| {
            frame
                .lines()
                .find_map(|line| line.strip_prefix("data:"))
                .map(|json| serde_json::from_str(json.trim()).unwrap())
        })
        .collect()
}
