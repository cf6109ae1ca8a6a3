//! Download and resize engines plus the per-task scope they run in.
//!
//! Engines never return task failures to the worker loop: every outcome ends
//! as a task-status update and a notifier event.  The `Err` they can return is
//! reserved for failing to record that outcome.

mod download;
mod progress;
mod resize;

pub use download::start_download;
pub use resize::start_resize;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::entities::{AlbumStore, AssetStore, ProfileStore, TaskStatus, TaskStore};
use crate::error::EngineError;
use crate::notify::{ProgressEvent, ProgressNotifier};
use crate::runtime::{Job, JobRunner, WorkItem};
use crate::source::AssetSource;

/// Every store interface an engine needs.
pub trait Store: TaskStore + AlbumStore + AssetStore + ProfileStore + Clone {}

impl<T> Store for T where T: TaskStore + AlbumStore + AssetStore + ProfileStore + Clone {}

/// Resources owned by a single task execution, dropped when it ends.
pub struct TaskScope<S> {
    pub store: S,
    pub source: Option<Arc<dyn AssetSource>>,
    pub notifier: Arc<dyn ProgressNotifier>,
    pub config: Arc<EngineConfig>,
}

impl<S> TaskScope<S> {
    pub(crate) fn source(&self) -> Result<&dyn AssetSource, EngineError> {
        self.source
            .as_deref()
            .ok_or_else(|| EngineError::Config("Immich URL and API key must be configured".into()))
    }
}

/// [`JobRunner`] that builds a fresh [`TaskScope`] for every job and
/// dispatches it to the matching engine.
pub struct EngineRunner<S> {
    store: S,
    source: Option<Arc<dyn AssetSource>>,
    notifier: Arc<dyn ProgressNotifier>,
    config: Arc<EngineConfig>,
}

impl<S: Store> EngineRunner<S> {
    pub fn new(
        store: S,
        source: Option<Arc<dyn AssetSource>>,
        notifier: Arc<dyn ProgressNotifier>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            source,
            notifier,
            config,
        }
    }

    fn scope(&self) -> TaskScope<S> {
        TaskScope {
            store: self.store.clone(),
            source: self.source.clone(),
            notifier: Arc::clone(&self.notifier),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: Store> JobRunner for EngineRunner<S> {
    async fn run(&self, job: Job) -> Result<(), EngineError> {
        let scope = self.scope();
        match &job.item {
            WorkItem::Download {
                task_id,
                album_id,
                album_name,
            } => start_download(&scope, task_id, album_id, album_name, &job.cancel).await,
            WorkItem::Resize {
                task_id,
                album_id,
                profile_id,
            } => start_resize(&scope, task_id, album_id, *profile_id, &job.cancel).await,
        }
    }

    async fn abandon(&self, task_id: &str, message: &str) -> Result<(), EngineError> {
        let Some(task) = self.store.get_task(task_id).await? else {
            return Ok(());
        };
        if task.status.is_terminal() {
            return Ok(());
        }
        self.store.set_task_status(task_id, TaskStatus::Error, message).await?;
        self.notifier.notify(&ProgressEvent {
            task_id: task_id.to_owned(),
            status: TaskStatus::Error,
            progress: task.progress,
            total: task.total,
            message: message.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests;
