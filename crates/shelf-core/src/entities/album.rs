use std::future::Future;
use std::path::PathBuf;

use chrono::Utc;

use crate::entities::{parse_timestamp, ArchiveOutput, DownloadedAlbum, NewDownloadedAlbum, SqliteStore};

pub trait AlbumStore: Send + Sync + 'static {
    /// Insert `album`, removing any previous record for the same remote album
    /// in the same transaction. Returns the new row id.
    fn replace_album(
        &self,
        album: NewDownloadedAlbum,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    fn get_album(
        &self,
        album_id: &str,
    ) -> impl Future<Output = Result<Option<DownloadedAlbum>, sqlx::Error>> + Send;

    fn list_albums(&self) -> impl Future<Output = Result<Vec<DownloadedAlbum>, sqlx::Error>> + Send;

    fn delete_album(&self, album_id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

type AlbumRow = (i64, String, String, i64, i64, String, String);

fn album_from_row((id, album_id, album_name, asset_count, total_size, output_path, created_at): AlbumRow) -> DownloadedAlbum {
    DownloadedAlbum {
        id,
        album_id,
        album_name,
        asset_count,
        total_size,
        output: ArchiveOutput::FilePath(PathBuf::from(output_path)),
        created_at: parse_timestamp(&created_at, "downloaded_albums.created_at"),
    }
}

impl AlbumStore for SqliteStore {
    async fn replace_album(&self, album: NewDownloadedAlbum) -> Result<i64, sqlx::Error> {
        let Some(path) = album.output.file_path() else {
            return Err(sqlx::Error::Protocol(
                "inline chunk archives cannot be persisted; store a file path".into(),
            ));
        };
        let output_path = path.to_string_lossy().into_owned();
        let created_at = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM downloaded_albums WHERE album_id = ?1")
            .bind(&album.album_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let id = sqlx::query(
            "INSERT INTO downloaded_albums (album_id, album_name, asset_count, total_size, output_path, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&album.album_id)
        .bind(&album.album_name)
        .bind(album.asset_count)
        .bind(album.total_size)
        .bind(&output_path)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        tx.commit().await?;

        if removed > 0 {
            tracing::debug!(album_id = %album.album_id, "superseded previous album record");
        }
        Ok(id)
    }

    async fn get_album(&self, album_id: &str) -> Result<Option<DownloadedAlbum>, sqlx::Error> {
        let row: Option<AlbumRow> = sqlx::query_as(
            "SELECT id, album_id, album_name, asset_count, total_size, output_path, created_at \
             FROM downloaded_albums WHERE album_id = ?1",
        )
        .bind(album_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(album_from_row))
    }

    async fn list_albums(&self) -> Result<Vec<DownloadedAlbum>, sqlx::Error> {
        let rows: Vec<AlbumRow> = sqlx::query_as(
            "SELECT id, album_id, album_name, asset_count, total_size, output_path, created_at \
             FROM downloaded_albums ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(album_from_row).collect())
    }

    async fn delete_album(&self, album_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM downloaded_albums WHERE album_id = ?1")
            .bind(album_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
