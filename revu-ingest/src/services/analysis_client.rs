//! Remote analysis client
//!
//! Starts the remote review analysis for a product and relays its
//! Server-Sent Events stream into the task registry. Remote progress runs
//! 0-100 and is mapped onto the 35-100 band of the upload task, after the
//! ingestion phase.

use std::time::Duration;

use futures::StreamExt;
use revu_common::events::{AnalysisEvent, TaskStatus};
use thiserror::Error;

use super::task_registry::TaskRegistry;

const USER_AGENT: &str = concat!("revu-ingest/", env!("CARGO_PKG_VERSION"));

/// Task progress when the analysis phase begins
pub const ANALYSIS_PHASE_START: u8 = 35;

/// Share of the task's progress bar given to the analysis phase
const ANALYSIS_PHASE_WEIGHT: f64 = 0.65;

/// Analysis relay errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Analysis service responded with status {0}")]
    Status(u16),

    #[error("Stream read failed: {0}")]
    Stream(String),
}

/// Map remote progress (0-100) onto task progress (35-100)
pub fn rescale_progress(remote_progress: f64) -> u8 {
    if !remote_progress.is_finite() {
        return ANALYSIS_PHASE_START;
    }
    let scaled = f64::from(ANALYSIS_PHASE_START) + remote_progress * ANALYSIS_PHASE_WEIGHT;
    scaled.round().clamp(f64::from(ANALYSIS_PHASE_START), 100.0) as u8
}

/// Decode one stream line; `None` for anything that is not a `data:` frame
/// with a readable event
fn parse_data_line(line: &str) -> Option<AnalysisEvent> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, line = %payload, "Skipping malformed analysis event");
            None
        }
    }
}

/// Client for the remote analysis service
#[derive(Clone)]
pub struct AnalysisClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AnalysisError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn analysis_url(&self, product_id: i64) -> String {
        format!("{}/v1/products/{}/reviews/analysis", self.base_url, product_id)
    }

    /// Run the remote analysis and mirror its progress into `task_id`
    ///
    /// A `complete`/`result` frame completes the task and an `error` frame
    /// fails it; if the stream simply ends, the task is completed. Request
    /// and read failures are returned for the caller to record.
    pub async fn relay_analysis(
        &self,
        registry: &TaskRegistry,
        task_id: &str,
        product_id: i64,
    ) -> Result<(), AnalysisError> {
        let url = self.analysis_url(product_id);
        tracing::debug!(task_id = %task_id, url = %url, "Requesting remote analysis");

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AnalysisError::Stream(e.to_string()))?;
            buffer.extend_from_slice(&chunk);

            // Frames may be split across chunks; only consume whole lines
            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line);
                if self.handle_line(registry, task_id, line.trim_end()).await {
                    return Ok(());
                }
            }
        }

        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer).into_owned();
            if self.handle_line(registry, task_id, line.trim_end()).await {
                return Ok(());
            }
        }

        tracing::debug!(task_id = %task_id, "Analysis stream ended without a final step");
        registry.complete(task_id, "Analysis complete").await;
        Ok(())
    }

    /// Apply one line to the task; returns true once the task is finished
    async fn handle_line(&self, registry: &TaskRegistry, task_id: &str, line: &str) -> bool {
        let Some(event) = parse_data_line(line) else {
            return false;
        };

        if event.is_success() {
            registry.complete(task_id, "Analysis complete").await;
            return true;
        }

        if event.is_failure() {
            let message = if event.message.is_empty() {
                "Analysis failed".to_string()
            } else {
                event.message
            };
            registry.error(task_id, message).await;
            return true;
        }

        let message = if event.message.is_empty() {
            "Analyzing reviews...".to_string()
        } else {
            event.message
        };
        registry
            .update(
                task_id,
                rescale_progress(event.progress),
                message,
                TaskStatus::Processing,
            )
            .await;
        false
    }
}
