//! Persistence layer.
//!
//! Each record family has its own store trait ([`TaskStore`], [`AlbumStore`],
//! [`AssetStore`], [`ProfileStore`]) implemented for [`SqliteStore`].  To swap
//! to another database, implement the traits for a new type.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` indirection is needed on this hot path.
//!
//! Queries use the runtime-checked `sqlx::query` form so no `DATABASE_URL` is
//! needed at compile time.  Timestamps are stored as RFC 3339 text.

pub mod album;
pub mod asset;
pub mod dao;
pub mod profile;
pub mod task;

pub use dao::{
    ArchiveOutput, DownloadedAlbum, NewDownloadedAlbum, NewProfile, ProfileRecord, TaskKind,
    TaskRecord, TaskStatus,
};

pub use album::AlbumStore;
pub use asset::AssetStore;
pub use profile::ProfileStore;
pub use task::TaskStore;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// SQLite-backed store for tasks, albums, asset markers and profiles.
///
/// Cloning is cheap: clones share one connection pool.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://shelf.db"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Close every pooled connection. Further queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub(crate) fn parse_timestamp(raw: &str, column: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, column, error = %e, "failed to parse timestamp; using now");
        Utc::now()
    })
}
