use std::path::{Path, PathBuf};

/// Engine settings, resolved once and shared read-only by every task.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Where download archives are written (`{task_id}.zip`).
    pub download_root: PathBuf,

    /// Where resize archives are written (`{task_id}.zip`).
    pub resize_root: PathBuf,

    /// Assets fetched per chunk; bounds the per-chunk working set.
    pub chunk_size: usize,

    /// Simultaneous asset fetches within a chunk.
    pub max_concurrent_fetches: usize,

    /// Completed items between progress reports.
    pub progress_interval: usize,

    /// Work-queue capacity.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_root: PathBuf::from("downloads"),
            resize_root: PathBuf::from("resized"),
            chunk_size: 50,
            max_concurrent_fetches: 5,
            progress_interval: 10,
            queue_capacity: 100,
        }
    }
}

impl EngineConfig {
    pub fn download_path(&self, task_id: &str) -> PathBuf {
        archive_path(&self.download_root, task_id)
    }

    pub fn resize_path(&self, task_id: &str) -> PathBuf {
        archive_path(&self.resize_root, task_id)
    }
}

fn archive_path(root: &Path, task_id: &str) -> PathBuf {
    root.join(format!("{task_id}.zip"))
}
