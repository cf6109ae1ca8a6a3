//! Submission facade: creates task records, enqueues work and owns the worker.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::remove_partial;
use crate::config::EngineConfig;
use crate::engine::{EngineRunner, Store};
use crate::entities::{TaskKind, TaskRecord, TaskStatus};
use crate::error::EngineError;
use crate::notify::ProgressNotifier;
use crate::runtime::{run_worker, CancelRegistry, Job, TaskQueue, WorkItem};
use crate::source::AssetSource;

/// Maximum rows returned by [`Shelf::list_tasks`].
pub const TASK_LIST_LIMIT: i64 = 50;

/// Handle to a running engine: queue, cancellation registry and worker loop.
///
/// ```rust,ignore
/// let shelf = Shelf::start(store, Some(source), notifier, EngineConfig::default());
/// let task_id = shelf.submit_download("album-id", "Holidays").await?;
/// shelf.cancel(&task_id);
/// shelf.shutdown().await;
/// ```
pub struct Shelf<S> {
    store: S,
    queue: TaskQueue,
    registry: Arc<CancelRegistry>,
    stop: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl<S: Store> Shelf<S> {
    /// Spawn the worker loop. Must be called inside a tokio runtime.
    pub fn start(
        store: S,
        source: Option<Arc<dyn AssetSource>>,
        notifier: Arc<dyn ProgressNotifier>,
        config: EngineConfig,
    ) -> Self {
        let (queue, rx) = TaskQueue::bounded(config.queue_capacity);
        let (stop, stop_rx) = watch::channel(false);
        let registry = Arc::new(CancelRegistry::new());
        let runner = Arc::new(EngineRunner::new(store.clone(), source, notifier, Arc::new(config)));
        let worker = tokio::spawn(run_worker(rx, stop_rx, runner, Arc::clone(&registry)));

        Self {
            store,
            queue,
            registry,
            stop,
            worker,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue a download of `album_id` and return the new task id.
    pub async fn submit_download(&self, album_id: &str, album_name: &str) -> Result<String, EngineError> {
        let task_id = Uuid::new_v4().to_string();
        self.submit(WorkItem::Download {
            task_id,
            album_id: album_id.to_owned(),
            album_name: album_name.to_owned(),
        })
        .await
    }

    /// Queue a resize of the archive downloaded for `album_id`.
    pub async fn submit_resize(&self, album_id: &str, profile_id: i64) -> Result<String, EngineError> {
        let task_id = Uuid::new_v4().to_string();
        self.submit(WorkItem::Resize {
            task_id,
            album_id: album_id.to_owned(),
            profile_id,
        })
        .await
    }

    async fn submit(&self, item: WorkItem) -> Result<String, EngineError> {
        let task_id = item.task_id().to_owned();
        let input = serde_json::to_string(&item).ok();
        self.store
            .insert_task(TaskRecord::pending(&task_id, item.kind(), input))
            .await?;

        let cancel = self.registry.register(&task_id);
        if !self.queue.enqueue(Job { item, cancel }) {
            self.registry.remove(&task_id);
            self.store
                .set_task_status(&task_id, TaskStatus::Error, "Task queue is full")
                .await?;
            return Err(EngineError::QueueFull {
                capacity: self.queue.capacity(),
            });
        }
        info!(task_id = %task_id, "task queued");
        Ok(task_id)
    }

    /// Trip the cancellation signal of a queued or running task.
    pub fn cancel(&self, task_id: &str) -> bool {
        let found = self.registry.cancel(task_id);
        if found {
            info!(task_id, "cancellation requested");
        } else {
            warn!(task_id, "cancel: task not queued or running");
        }
        found
    }

    pub async fn task(&self, task_id: &str) -> Result<Option<TaskRecord>, EngineError> {
        Ok(self.store.get_task(task_id).await?)
    }

    /// Newest first, at most [`TASK_LIST_LIMIT`].
    pub async fn list_tasks(&self, kind: Option<TaskKind>) -> Result<Vec<TaskRecord>, EngineError> {
        Ok(self.store.list_tasks(kind, TASK_LIST_LIMIT).await?)
    }

    /// Delete a finished task and its output archive.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), EngineError> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("task {task_id} not found")))?;
        if !task.status.is_terminal() {
            return Err(EngineError::TaskActive(task_id.to_owned()));
        }
        if let Some(path) = task.output_path.as_deref() {
            remove_partial(std::path::Path::new(path)).await?;
        }
        self.store.delete_task(task_id).await?;
        info!(task_id, "task deleted");
        Ok(())
    }

    /// Stop the worker after its current job and wait for it.
    ///
    /// Jobs still queued are left pending; the next start marks them
    /// interrupted.
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "worker loop ended abnormally");
        }
    }
}
