use tokio::sync::Mutex;

use crate::entities::{TaskStatus, TaskStore};
use crate::error::EngineError;
use crate::notify::{ProgressEvent, ProgressNotifier};

/// Writes progress to the task record and the notifier.
///
/// Reports that would move progress backwards are dropped, and the lock is
/// held across the store write so records land in report order.
pub(crate) struct ProgressReporter<'a, S> {
    store: &'a S,
    notifier: &'a dyn ProgressNotifier,
    task_id: &'a str,
    last: Mutex<(i64, i64)>,
}

impl<'a, S: TaskStore> ProgressReporter<'a, S> {
    pub(crate) fn new(store: &'a S, notifier: &'a dyn ProgressNotifier, task_id: &'a str) -> Self {
        Self {
            store,
            notifier,
            task_id,
            last: Mutex::new((0, 0)),
        }
    }

    pub(crate) async fn report(&self, progress: usize, total: usize, message: &str) -> Result<(), EngineError> {
        let (progress, total) = (progress as i64, total as i64);
        let mut last = self.last.lock().await;
        if progress < last.0 {
            return Ok(());
        }
        *last = (progress, total);
        self.store
            .update_progress(self.task_id, progress, total, message)
            .await?;
        self.emit(TaskStatus::InProgress, progress, total, message);
        Ok(())
    }

    pub(crate) async fn complete(&self, message: &str) -> Result<(), EngineError> {
        self.finish(TaskStatus::Completed, message).await
    }

    pub(crate) async fn fail(&self, message: &str) -> Result<(), EngineError> {
        self.finish(TaskStatus::Error, message).await
    }

    async fn finish(&self, status: TaskStatus, message: &str) -> Result<(), EngineError> {
        let last = self.last.lock().await;
        self.store.set_task_status(self.task_id, status, message).await?;
        self.emit(status, last.0, last.1, message);
        Ok(())
    }

    fn emit(&self, status: TaskStatus, progress: i64, total: i64, message: &str) {
        self.notifier.notify(&ProgressEvent {
            task_id: self.task_id.to_owned(),
            status,
            progress,
            total,
            message: message.to_owned(),
        });
    }
}

/// Whether `done` completed items warrant a report.
pub(crate) fn due(done: usize, total: usize, interval: usize) -> bool {
    done == total || done % interval.max(1) == 0
}
