//! Bounded work queue and the single worker loop that drains it.

pub mod cancel;
pub mod queue;
pub mod types;
pub mod worker;

pub use cancel::{CancelRegistry, CancelSignal};
pub use queue::{QueueReceiver, TaskQueue};
pub use types::{Job, WorkItem};
pub use worker::{run_worker, JobRunner};
