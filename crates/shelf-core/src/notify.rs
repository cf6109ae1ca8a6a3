use serde::Serialize;
use tokio::sync::broadcast;

use crate::entities::TaskStatus;

/// One progress, completion or failure report for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: i64,
    pub total: i64,
    pub message: String,
}

/// Receives task events. Implementations must not block.
pub trait ProgressNotifier: Send + Sync + 'static {
    fn notify(&self, event: &ProgressEvent);
}

/// Fan-out notifier backed by a tokio broadcast channel.
///
/// Subscribers that fall behind lose the oldest events; senders never wait.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ProgressEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressNotifier for BroadcastNotifier {
    fn notify(&self, event: &ProgressEvent) {
        // No receivers is fine.
        let _ = self.tx.send(event.clone());
    }
}
