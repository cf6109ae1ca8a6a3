pub mod album;
pub mod profile;
pub mod task;

pub use album::{ArchiveOutput, DownloadedAlbum, NewDownloadedAlbum};
pub use profile::{NewProfile, ProfileRecord};
pub use task::{TaskKind, TaskRecord, TaskStatus};
