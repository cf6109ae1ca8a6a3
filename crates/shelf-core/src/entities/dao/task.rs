use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which engine executes a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Download,
    Resize,
}

/// Lifecycle of a task: `Pending → InProgress → {Completed | Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

/// A row in the `tasks` table.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress: i64,
    pub total: i64,
    pub current_step: Option<String>,
    /// JSON of the work item that created this task.
    pub input_data: Option<String>,
    pub output_path: Option<String>,
    pub output_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Set when the task reaches `Completed` or `Error`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// A freshly queued task.
    pub fn pending(id: impl Into<String>, kind: TaskKind, input_data: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            status: TaskStatus::Pending,
            progress: 0,
            total: 0,
            current_step: Some("Queued".to_owned()),
            input_data,
            output_path: None,
            output_size: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
