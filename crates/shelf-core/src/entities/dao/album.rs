use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Where an album's archive lives.
///
/// Only `FilePath` is produced or persisted by this crate. `InlineChunks`
/// models archives that older deployments stored as ordered blobs inside the
/// database; converting those is a migration concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutput {
    FilePath(PathBuf),
    InlineChunks(Vec<Vec<u8>>),
}

impl ArchiveOutput {
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            ArchiveOutput::FilePath(path) => Some(path),
            ArchiveOutput::InlineChunks(_) => None,
        }
    }
}

/// A row in the `downloaded_albums` table.
#[derive(Debug, Clone)]
pub struct DownloadedAlbum {
    pub id: i64,
    /// Remote album identifier.
    pub album_id: String,
    pub album_name: String,
    /// Entries written into `output` by the download that produced it.
    pub asset_count: i64,
    /// Archive size in bytes.
    pub total_size: i64,
    pub output: ArchiveOutput,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`crate::entities::AlbumStore::replace_album`].
#[derive(Debug, Clone)]
pub struct NewDownloadedAlbum {
    pub album_id: String,
    pub album_name: String,
    pub asset_count: i64,
    pub total_size: i64,
    pub output: ArchiveOutput,
}
