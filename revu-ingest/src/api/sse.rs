//! Server-Sent Events (SSE) for upload progress streaming
//!
//! GET /products/:product_id/reviews/upload/progress/:task_id
//!
//! Browser EventSource clients cannot set headers, so the bearer token may
//! also come as `?token=`. Authentication, lookup and ownership are checked
//! before the stream opens (401, 404, 403).
//!
//! The stream sends the task's current state at once, then re-reads the
//! registry every poll interval. It closes after a completed or error
//! frame, or after a single `expired` frame once the task is gone.

use crate::api::auth::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use revu_common::api::TokenQuery;
use revu_common::events::TaskProgressEvent;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Disables response buffering in nginx-style proxies
const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

fn progress_frame(event: &TaskProgressEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        warn!("SSE: Failed to serialize progress event: {}", e);
        Event::default().comment("serialization failed")
    })
}

/// GET /products/:product_id/reviews/upload/progress/:task_id
pub async fn upload_progress_stream(
    State(state): State<AppState>,
    Path((product_id, task_id)): Path<(i64, String)>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&headers, query.token.as_deref(), &state.config.jwt_secret)?;

    let task = state
        .registry
        .get(&task_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    if task.user_id != claims.id {
        warn!(
            task_id = %task_id,
            user_id = claims.id,
            "SSE: Progress requested by a user who does not own the task"
        );
        return Err(ApiError::Forbidden(
            "Task belongs to another user".to_string(),
        ));
    }

    info!(task_id = %task_id, product_id, user_id = claims.id, "SSE: Progress client connected");

    let registry = state.registry.clone();
    let poll_interval = state.config.progress_poll_interval;

    let stream = async_stream::stream! {
        let mut current = Some(task);

        loop {
            match current {
                Some(task) => {
                    yield Ok::<_, Infallible>(progress_frame(&task.to_event()));
                    if task.is_terminal() {
                        debug!(task_id = %task_id, status = %task.status, "SSE: Task finished, closing stream");
                        break;
                    }
                }
                None => {
                    debug!(task_id = %task_id, "SSE: Task expired, closing stream");
                    yield Ok(progress_frame(&TaskProgressEvent::expired()));
                    break;
                }
            }

            tokio::time::sleep(poll_interval).await;
            current = registry.get(&task_id).await;
        }
    };

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    );

    Ok(([(X_ACCEL_BUFFERING, "no")], sse))
}

/// Build progress stream routes
pub fn progress_routes() -> Router<AppState> {
    Router::new().route(
        "/products/:product_id/reviews/upload/progress/:task_id",
        get(upload_progress_stream),
    )
}
