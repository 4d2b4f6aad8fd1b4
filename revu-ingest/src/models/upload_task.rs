//! Upload task state
//!
//! A task tracks one upload-plus-analysis request from creation until its
//! retention timer removes it. Status only moves forward:
//! PENDING → PROCESSING → COMPLETED | ERROR

use chrono::{DateTime, Utc};
use revu_common::events::{TaskProgressEvent, TaskStatus};
use serde::Serialize;

/// In-memory upload task, owned by the task registry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTask {
    /// Opaque unique identifier handed to the client
    pub task_id: String,

    pub product_id: i64,

    /// Owner; only this user may watch the progress stream
    pub user_id: i64,

    /// Percentage complete (0 - 100)
    pub progress: u8,

    /// Current operation description
    pub message: String,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl UploadTask {
    /// Create a pending task
    pub fn new(task_id: String, product_id: i64, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            product_id,
            user_id,
            progress: 0,
            message: String::from("Preparing upload..."),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if task is terminal (finished)
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Snapshot sent over the progress stream
    pub fn to_event(&self) -> TaskProgressEvent {
        TaskProgressEvent {
            progress: self.progress,
            message: self.message.clone(),
            status: self.status,
        }
    }
}
