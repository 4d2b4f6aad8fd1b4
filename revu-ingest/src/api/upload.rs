//! Review upload API handler
//!
//! POST /products/:product_id/reviews/upload
//!
//! Multipart fields:
//! - `files` (repeated): review files, `.csv`, `.xlsx` or `.xls`
//! - `mappings`: JSON array of column mappings, parallel to `files`
//! - `autoAnalyze`: `true` to start the remote analysis afterwards
//!
//! Validates and buffers the request, registers a task, starts the
//! orchestrator in the background and answers 202 with the task id.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use bytes::BytesMut;
use serde::Serialize;

use super::auth::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::models::{ColumnMapping, UploadedFile};
use crate::AppState;

/// 202 response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub task_id: String,
    pub message: String,
}

/// Parsed multipart request
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    mappings: Vec<ColumnMapping>,
    auto_analyze: bool,
}

/// POST /products/:product_id/reviews/upload
pub async fn upload_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let claims = authenticate(&headers, None, &state.config.jwt_secret)?;

    let form = read_form(multipart, state.config.max_files, state.config.max_file_size).await?;

    let task_id = state.registry.create(product_id, claims.id).await;
    state
        .registry
        .schedule_cleanup(task_id.clone(), state.config.task_retention);

    tracing::info!(
        task_id = %task_id,
        product_id,
        user_id = claims.id,
        files = form.files.len(),
        auto_analyze = form.auto_analyze,
        "Review upload accepted"
    );

    let orchestrator = state.orchestrator.clone();
    let background_task_id = task_id.clone();
    tokio::spawn(async move {
        orchestrator
            .process_upload(
                &background_task_id,
                product_id,
                form.files,
                form.mappings,
                form.auto_analyze,
            )
            .await;
        tracing::debug!(task_id = %background_task_id, "Background upload task finished");
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            task_id,
            message: "Upload accepted, processing in background".to_string(),
        }),
    ))
}

async fn read_form(
    mut multipart: Multipart,
    max_files: usize,
    max_file_size: usize,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();
    let mut mappings_json: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "files" => {
                if form.files.len() >= max_files {
                    return Err(ApiError::BadRequest(format!(
                        "Too many files (maximum {})",
                        max_files
                    )));
                }

                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("file{}", form.files.len() + 1));

                let mut data = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", file_name, e)))?
                {
                    if data.len() + chunk.len() > max_file_size {
                        return Err(ApiError::BadRequest(format!(
                            "File {} exceeds the {} byte limit",
                            file_name, max_file_size
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }

                form.files.push(UploadedFile::new(file_name, data.freeze()));
            }
            "mappings" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read mappings: {}", e)))?;
                mappings_json = Some(text);
            }
            "autoAnalyze" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read autoAnalyze: {}", e)))?;
                form.auto_analyze = parse_flag(&text);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    if form.files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    if let Some(json) = mappings_json.filter(|json| !json.trim().is_empty()) {
        form.mappings = serde_json::from_str(&json)
            .map_err(|e| ApiError::BadRequest(format!("Invalid mappings: {}", e)))?;
    }

    Ok(form)
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Build upload routes with a body limit sized for `max_request_body`
pub fn upload_routes(max_request_body: usize) -> Router<AppState> {
    Router::new()
        .route("/products/:product_id/reviews/upload", post(upload_reviews))
        .layer(DefaultBodyLimit::max(max_request_body))
}
