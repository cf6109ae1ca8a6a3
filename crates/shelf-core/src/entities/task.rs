use std::future::Future;

use chrono::Utc;

use crate::entities::{parse_timestamp, SqliteStore, TaskKind, TaskRecord, TaskStatus};

pub trait TaskStore: Send + Sync + 'static {
    fn insert_task(&self, record: TaskRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Move the task to `InProgress` with new counters and step text.
    fn update_progress(
        &self,
        id: &str,
        progress: i64,
        total: i64,
        current_step: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Set status and step; terminal statuses also stamp `completed_at`.
    fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        current_step: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn set_task_output(
        &self,
        id: &str,
        output_path: &str,
        output_size: i64,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn get_task(&self, id: &str) -> impl Future<Output = Result<Option<TaskRecord>, sqlx::Error>> + Send;

    /// Newest first.
    fn list_tasks(
        &self,
        kind: Option<TaskKind>,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<TaskRecord>, sqlx::Error>> + Send;

    fn delete_task(&self, id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Fail every task a previous process left pending or in progress.
    fn interrupt_running_tasks(&self) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

const TASK_COLUMNS: &str = "id, kind, status, progress, total, current_step, input_data, \
                            output_path, output_size, created_at, completed_at";

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    kind: String,
    status: String,
    progress: i64,
    total: i64,
    current_step: Option<String>,
    input_data: Option<String>,
    output_path: Option<String>,
    output_size: Option<i64>,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = sqlx::Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<TaskKind>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(TaskRecord {
            id: row.id,
            kind,
            status,
            progress: row.progress,
            total: row.total,
            current_step: row.current_step,
            input_data: row.input_data,
            output_path: row.output_path,
            output_size: row.output_size,
            created_at: parse_timestamp(&row.created_at, "tasks.created_at"),
            completed_at: row
                .completed_at
                .as_deref()
                .map(|raw| parse_timestamp(raw, "tasks.completed_at")),
        })
    }
}

impl TaskStore for SqliteStore {
    async fn insert_task(&self, record: TaskRecord) -> Result<(), sqlx::Error> {
        let created_at = record.created_at.to_rfc3339();
        let completed_at = record.completed_at.map(|t| t.to_rfc3339());
        sqlx::query(
            "INSERT INTO tasks (id, kind, status, progress, total, current_step, input_data, \
             output_path, output_size, created_at, completed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&record.id)
        .bind(record.kind.to_string())
        .bind(record.status.to_string())
        .bind(record.progress)
        .bind(record.total)
        .bind(&record.current_step)
        .bind(&record.input_data)
        .bind(&record.output_path)
        .bind(record.output_size)
        .bind(&created_at)
        .bind(&completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_progress(
        &self,
        id: &str,
        progress: i64,
        total: i64,
        current_step: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = ?1, progress = ?2, total = ?3, current_step = ?4 WHERE id = ?5",
        )
        .bind(TaskStatus::InProgress.to_string())
        .bind(progress)
        .bind(total)
        .bind(current_step)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        current_step: &str,
    ) -> Result<(), sqlx::Error> {
        let completed_at = status.is_terminal().then(|| Utc::now().to_rfc3339());
        sqlx::query(
            "UPDATE tasks SET status = ?1, current_step = ?2, \
             completed_at = COALESCE(?3, completed_at) WHERE id = ?4",
        )
        .bind(status.to_string())
        .bind(current_step)
        .bind(&completed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_task_output(&self, id: &str, output_path: &str, output_size: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET output_path = ?1, output_size = ?2 WHERE id = ?3")
            .bind(output_path)
            .bind(output_size)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<TaskRecord>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskRecord::try_from).transpose()
    }

    async fn list_tasks(&self, kind: Option<TaskKind>, limit: i64) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let rows: Vec<TaskRow> = if let Some(kind) = kind {
            sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE kind = ?1 ORDER BY created_at DESC LIMIT ?2"
            ))
            .bind(kind.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC LIMIT ?1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };
        rows.into_iter().map(TaskRecord::try_from).collect()
    }

    async fn delete_task(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn interrupt_running_tasks(&self) -> Result<u64, sqlx::Error> {
        let completed_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE tasks SET status = 'error', current_step = 'Interrupted by restart', \
             completed_at = ?1 WHERE status IN ('pending', 'in_progress')",
        )
        .bind(&completed_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
