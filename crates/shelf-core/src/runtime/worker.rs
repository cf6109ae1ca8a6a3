use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::EngineError;
use crate::runtime::cancel::CancelRegistry;
use crate::runtime::queue::QueueReceiver;
use crate::runtime::types::Job;

/// Executes one dequeued job.
///
/// Implementations build whatever per-task resources they need inside `run`
/// and release them before returning.
pub trait JobRunner: Send + Sync + 'static {
    fn run(&self, job: Job) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Record a terminal failure for a job whose `run` panicked or could not
    /// record its own outcome.
    fn abandon(&self, task_id: &str, message: &str) -> impl Future<Output = Result<(), EngineError>> + Send;
}

/// Drain `queue` one job at a time until `stop` is set.
///
/// Each job runs on its own tokio task so that a panic or an error is logged,
/// and the job abandoned, without ending the loop.
pub async fn run_worker<R: JobRunner>(
    mut queue: QueueReceiver,
    mut stop: watch::Receiver<bool>,
    runner: Arc<R>,
    registry: Arc<CancelRegistry>,
) {
    info!("worker loop started");
    while let Some(job) = queue.dequeue(&mut stop).await {
        let task_id = job.item.task_id().to_owned();
        let kind = job.item.kind();

        let handle = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run(job).await }
        });
        let message = match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(task_id = %task_id, %kind, error = %e, "work item failed");
                Some(format!("Task failed: {e}"))
            }
            Err(e) => {
                error!(task_id = %task_id, %kind, error = %e, "work item panicked");
                Some("Task crashed unexpectedly".to_owned())
            }
        };
        if let Some(message) = message {
            if let Err(e) = runner.abandon(&task_id, &message).await {
                warn!(task_id = %task_id, error = %e, "could not mark work item failed");
            }
        }
        registry.remove(&task_id);
    }
    info!("worker loop stopped");
}
