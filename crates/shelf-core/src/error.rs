use thiserror::Error;

use crate::archive::ArchiveError;
use crate::source::SourceError;

/// Everything that can end a download or resize task.
///
/// Engines turn each of these into a task-status update plus a notifier
/// event; none of them ever reach the worker loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The remote source (or another required setting) is not configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced album, profile or task does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Propagated from the remote asset source.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Reading or writing an archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Propagated from the SQLite store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The task has not reached a terminal state yet.
    #[error("task {0} is still queued or running")]
    TaskActive(String),

    /// The work queue rejected a submission.
    #[error("task queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The task's cancellation signal was tripped.
    #[error("cancelled")]
    Cancelled,

    /// A blocking helper thread panicked or was aborted.
    #[error("worker thread failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
