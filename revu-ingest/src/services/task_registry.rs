//! Task registry
//!
//! Process-wide store of upload task state. The registry is a cloneable
//! handle passed to the upload handler, the orchestrator, the analysis
//! relay and the progress stream; every operation takes the lock once.
//!
//! Tasks stay in the registry until their retention timer fires, whether or
//! not they finished. A removed task is reported as expired by the progress
//! stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use revu_common::events::TaskStatus;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::UploadTask;

/// Shared registry of upload tasks
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, UploadTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending task and return its id
    pub async fn create(&self, product_id: i64, user_id: i64) -> String {
        let task_id = Uuid::new_v4().to_string();
        let task = UploadTask::new(task_id.clone(), product_id, user_id);

        self.tasks.write().await.insert(task_id.clone(), task);

        tracing::info!(task_id = %task_id, product_id, user_id, "Upload task created");
        task_id
    }

    /// Snapshot of a task
    pub async fn get(&self, task_id: &str) -> Option<UploadTask> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Update progress, message and status
    ///
    /// Returns `false` when the task is unknown or already finished. Progress
    /// never goes backwards except when the task fails, and status never
    /// moves back along pending → processing → completed/error.
    pub async fn update(
        &self,
        task_id: &str,
        progress: u8,
        message: impl Into<String>,
        status: TaskStatus,
    ) -> bool {
        if status == TaskStatus::Expired {
            tracing::warn!(task_id = %task_id, "Refusing to store expired status");
            return false;
        }

        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(task_id) else {
            tracing::warn!(task_id = %task_id, "Update for unknown task ignored");
            return false;
        };

        if task.is_terminal() {
            tracing::debug!(
                task_id = %task_id,
                current = %task.status,
                requested = %status,
                "Update for finished task ignored"
            );
            return false;
        }

        let progress = progress.min(100);
        task.progress = if status == TaskStatus::Error {
            progress
        } else {
            progress.max(task.progress)
        };
        if status.rank() >= task.status.rank() {
            task.status = status;
        }
        task.message = message.into();
        task.updated_at = Utc::now();

        tracing::debug!(
            task_id = %task_id,
            progress = task.progress,
            status = %task.status,
            message = %task.message,
            "Task updated"
        );
        true
    }

    /// Mark a task completed at 100%
    pub async fn complete(&self, task_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let updated = self
            .update(task_id, 100, message.clone(), TaskStatus::Completed)
            .await;
        if updated {
            tracing::info!(task_id = %task_id, message = %message, "Upload task completed");
        }
        updated
    }

    /// Mark a task failed; progress resets to 0
    pub async fn error(&self, task_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let updated = self
            .update(task_id, 0, message.clone(), TaskStatus::Error)
            .await;
        if updated {
            tracing::error!(task_id = %task_id, message = %message, "Upload task failed");
        }
        updated
    }

    /// Drop a task immediately
    pub async fn remove(&self, task_id: &str) -> Option<UploadTask> {
        self.tasks.write().await.remove(task_id)
    }

    /// Remove the task after `delay`, whatever its state by then
    pub fn schedule_cleanup(&self, task_id: String, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.remove(&task_id).await.is_some() {
                tracing::info!(task_id = %task_id, "Upload task expired and removed");
            }
        })
    }

    /// Number of tasks currently held
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
