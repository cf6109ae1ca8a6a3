//! Write-once / read-once ZIP streaming on blocking threads.
//!
//! [`ArchiveWriter`] keeps one file handle open for a whole task and appends
//! entries as they arrive; concurrent callers are serialized behind a lock
//! scoped to that handle.  [`ArchiveReader`] reads one entry at a time so at
//! most one entry is held in memory per call.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The writer was already finished.
    #[error("archive {0} is already closed")]
    Closed(PathBuf),

    #[error("archive worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result of [`ArchiveWriter::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

struct WriterState {
    zip: Option<ZipWriter<File>>,
    names: HashSet<String>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Upper bound on the buffer reserved up front for one entry.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Capacity to reserve for an entry whose header declares `declared` bytes.
/// Larger entries still read fully; the buffer grows as data arrives.
fn prealloc_len(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Final path component of `name`, accepting either separator.
pub fn entry_base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

/// Append-only archive shared by the tasks of one engine run.
#[derive(Clone)]
pub struct ArchiveWriter {
    path: PathBuf,
    state: Arc<Mutex<WriterState>>,
}

impl ArchiveWriter {
    /// Create (truncating) the archive at `path`, creating parent directories.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        let target = path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File, std::io::Error> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            File::create(&target)
        })
        .await??;

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(WriterState {
                zip: Some(ZipWriter::new(file)),
                names: HashSet::new(),
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add one stored entry and return the name it was written under.
    ///
    /// `name` is reduced to its last path component. If that name is already
    /// taken in this archive the entry is written as `{disambiguator}_{name}`.
    pub async fn append(&self, name: &str, disambiguator: &str, data: Bytes) -> Result<String, ArchiveError> {
        let base = entry_base_name(name);
        let base = if base.is_empty() { disambiguator } else { base }.to_owned();
        let disambiguator = disambiguator.to_owned();
        let state = Arc::clone(&self.state);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<String, ArchiveError> {
            let mut guard = lock(&state);
            let WriterState { zip, names } = &mut *guard;
            let zip = zip.as_mut().ok_or(ArchiveError::Closed(path))?;

            let mut entry = base;
            while names.contains(&entry) {
                entry = format!("{disambiguator}_{entry}");
            }
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .large_file(data.len() as u64 >= u32::MAX as u64);
            zip.start_file(entry.as_str(), options)?;
            zip.write_all(&data)?;
            names.insert(entry.clone());
            Ok(entry)
        })
        .await?
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> usize {
        lock(&self.state).names.len()
    }

    /// Write the central directory and close the file.
    pub async fn finish(self) -> Result<ArchiveSummary, ArchiveError> {
        let state = Arc::clone(&self.state);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<ArchiveSummary, ArchiveError> {
            let mut guard = lock(&state);
            let zip = guard.zip.take().ok_or_else(|| ArchiveError::Closed(path.clone()))?;
            let mut file = zip.finish()?;
            file.flush()?;
            let bytes = file.metadata()?.len();
            Ok(ArchiveSummary {
                path,
                entries: guard.names.len(),
                bytes,
            })
        })
        .await?
    }
}

/// Remove a partially written archive. A missing file is not an error.
pub async fn remove_partial(path: &Path) -> Result<(), std::io::Error> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Read-only view of an archive's file entries.
#[derive(Clone)]
pub struct ArchiveReader {
    archive: Arc<Mutex<ZipArchive<File>>>,
    /// Indices of non-directory entries.
    files: Arc<Vec<usize>>,
}

impl ArchiveReader {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        tokio::task::spawn_blocking(move || -> Result<Self, ArchiveError> {
            let mut archive = ZipArchive::new(File::open(&path)?)?;
            let mut files = Vec::with_capacity(archive.len());
            for i in 0..archive.len() {
                if !archive.by_index_raw(i)?.is_dir() {
                    files.push(i);
                }
            }
            Ok(Self {
                archive: Arc::new(Mutex::new(archive)),
                files: Arc::new(files),
            })
        })
        .await?
    }

    /// Number of file entries, directories excluded.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Name and full contents of the `n`th file entry, or `None` past the end.
    pub async fn read_entry(&self, n: usize) -> Result<Option<(String, Vec<u8>)>, ArchiveError> {
        let Some(&index) = self.files.get(n) else {
            return Ok(None);
        };
        let archive = Arc::clone(&self.archive);
        tokio::task::spawn_blocking(move || -> Result<Option<(String, Vec<u8>)>, ArchiveError> {
            let mut archive = lock(&archive);
            let mut entry = archive.by_index(index)?;
            let mut data = Vec::with_capacity(prealloc_len(entry.size()));
            entry.read_to_end(&mut data)?;
            Ok(Some((entry.name().to_owned(), data)))
        })
        .await?
    }
}
