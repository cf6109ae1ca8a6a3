use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

/// Receiving half of a per-task cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that can never trip.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the task is cancelled. Pends forever if the sender is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Cancellation senders for every queued or running task, keyed by task id.
#[derive(Default)]
pub struct CancelRegistry {
    senders: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl std::fmt::Debug for CancelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.senders.lock().map(|s| s.len()).unwrap_or(0);
        write!(f, "CancelRegistry({count} tasks)")
    }
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the signal for a new task.
    pub fn register(&self, task_id: impl Into<String>) -> CancelSignal {
        let (tx, rx) = watch::channel(false);
        if let Ok(mut map) = self.senders.lock() {
            map.insert(task_id.into(), tx);
        }
        CancelSignal { rx }
    }

    /// Trip the signal. Returns `true` if the task was known.
    pub fn cancel(&self, task_id: &str) -> bool {
        if let Ok(map) = self.senders.lock() {
            if let Some(tx) = map.get(task_id) {
                tx.send_replace(true);
                return true;
            }
        }
        false
    }

    pub fn remove(&self, task_id: &str) {
        if let Ok(mut map) = self.senders.lock() {
            map.remove(task_id);
        }
    }

    pub fn len(&self) -> usize {
        self.senders.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
