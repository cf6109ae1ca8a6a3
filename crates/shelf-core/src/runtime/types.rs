use serde::{Deserialize, Serialize};

use crate::entities::TaskKind;
use crate::runtime::cancel::CancelSignal;

/// A deferred unit of execution.
///
/// Serialized into the task record's `input_data` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    Download {
        task_id: String,
        album_id: String,
        album_name: String,
    },
    Resize {
        task_id: String,
        album_id: String,
        profile_id: i64,
    },
}

impl WorkItem {
    pub fn task_id(&self) -> &str {
        match self {
            WorkItem::Download { task_id, .. } | WorkItem::Resize { task_id, .. } => task_id,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            WorkItem::Download { .. } => TaskKind::Download,
            WorkItem::Resize { .. } => TaskKind::Resize,
        }
    }
}

/// A queued work item together with its cancellation signal.
#[derive(Debug, Clone)]
pub struct Job {
    pub item: WorkItem,
    pub cancel: CancelSignal,
}
