use std::collections::HashSet;
use std::future::Future;

use chrono::Utc;

use crate::entities::SqliteStore;

/// Per-asset completion markers that make album downloads incremental.
pub trait AssetStore: Send + Sync + 'static {
    fn downloaded_asset_ids(
        &self,
        album_id: &str,
    ) -> impl Future<Output = Result<HashSet<String>, sqlx::Error>> + Send;

    /// Idempotent: recording the same pair twice is a no-op.
    fn record_downloaded_asset(
        &self,
        album_id: &str,
        asset_id: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn count_downloaded_assets(&self, album_id: &str) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    /// Drop the markers for `asset_ids`, returning how many existed.
    fn forget_downloaded_assets(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl AssetStore for SqliteStore {
    async fn downloaded_asset_ids(&self, album_id: &str) -> Result<HashSet<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT asset_id FROM downloaded_assets WHERE album_id = ?1")
                .bind(album_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn record_downloaded_asset(&self, album_id: &str, asset_id: &str) -> Result<(), sqlx::Error> {
        let downloaded_at = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR IGNORE INTO downloaded_assets (album_id, asset_id, downloaded_at) VALUES (?1, ?2, ?3)",
        )
        .bind(album_id)
        .bind(asset_id)
        .bind(&downloaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_downloaded_assets(&self, album_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM downloaded_assets WHERE album_id = ?1")
            .bind(album_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn forget_downloaded_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;
        for asset_id in asset_ids {
            removed += sqlx::query("DELETE FROM downloaded_assets WHERE album_id = ?1 AND asset_id = ?2")
                .bind(album_id)
                .bind(asset_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }
}
