use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::runtime::types::Job;

/// Producer handle of the fixed-capacity work queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<Job>,
}

/// The single consumer side, owned by the worker loop.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Job>,
}

impl TaskQueue {
    pub fn bounded(capacity: usize) -> (Self, QueueReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, QueueReceiver { rx })
    }

    /// Never waits. Returns `false` when the queue is full or the worker is gone.
    pub fn enqueue(&self, job: Job) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    task_id = job.item.task_id(),
                    capacity = self.capacity(),
                    "work queue full; rejecting item"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(task_id = job.item.task_id(), "worker stopped; rejecting item");
                false
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl QueueReceiver {
    /// Wait for the next job. Returns `None` as soon as `stop` is set, even if
    /// items remain, or once every producer is dropped.
    pub async fn dequeue(&mut self, stop: &mut watch::Receiver<bool>) -> Option<Job> {
        if *stop.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            _ = stopped(stop) => None,
            job = self.rx.recv() => job,
        }
    }
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|s| *s).await.is_err() {
        std::future::pending::<()>().await;
    }
}
