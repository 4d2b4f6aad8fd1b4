//! Event types shared between the ingest service, its browser clients and
//! the remote analysis service

use serde::{Deserialize, Serialize};

/// Lifecycle status of an upload task
///
/// `Expired` is never stored; it is reported when a task has already been
/// removed by its retention timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Expired,
}

impl TaskStatus {
    /// Completed and Error end a task; nothing moves it afterwards
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    /// Position along pending → processing → {completed|error}
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Error => 2,
            TaskStatus::Expired => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of every frame on the upload progress stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgressEvent {
    /// 0-100
    pub progress: u8,
    pub message: String,
    pub status: TaskStatus,
}

impl TaskProgressEvent {
    /// Final frame sent when the task no longer exists
    pub fn expired() -> Self {
        Self {
            progress: 100,
            message: "Task expired".to_string(),
            status: TaskStatus::Expired,
        }
    }
}

/// Step marker carried by remote analysis frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStep {
    Progress,
    Complete,
    Result,
    Error,
    /// Any step name this service does not act on
    #[serde(other)]
    Other,
}

/// One `data:` frame from the remote analysis stream
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisEvent {
    /// Remote progress in the service's own 0-100 range
    #[serde(default)]
    pub progress: f64,

    #[serde(default)]
    pub message: String,

    #[serde(default = "default_step")]
    pub step: AnalysisStep,
}

fn default_step() -> AnalysisStep {
    AnalysisStep::Progress
}

impl AnalysisEvent {
    /// `complete` and `result` both mean the analysis finished
    pub fn is_success(&self) -> bool {
        matches!(self.step, AnalysisStep::Complete | AnalysisStep::Result)
    }

    pub fn is_failure(&self) -> bool {
        self.step == AnalysisStep::Error
    }
}
