use std::future::Future;

use chrono::Utc;

use crate::entities::{parse_timestamp, NewProfile, ProfileRecord, SqliteStore};

pub trait ProfileStore: Send + Sync + 'static {
    fn add_profile(&self, profile: NewProfile) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
    fn list_profiles(&self) -> impl Future<Output = Result<Vec<ProfileRecord>, sqlx::Error>> + Send;
    fn get_profile(&self, id: i64) -> impl Future<Output = Result<Option<ProfileRecord>, sqlx::Error>> + Send;
    /// Returns `false` when no profile has `id`.
    fn update_profile(
        &self,
        id: i64,
        profile: NewProfile,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    fn delete_profile(&self, id: i64) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

type ProfileRow = (i64, String, u32, u32, u8, bool, bool, String);

fn profile_from_row(
    (id, name, width, height, quality, include_horizontal, include_vertical, created_at): ProfileRow,
) -> ProfileRecord {
    ProfileRecord {
        id,
        name,
        width,
        height,
        quality,
        include_horizontal,
        include_vertical,
        created_at: parse_timestamp(&created_at, "resize_profiles.created_at"),
    }
}

const PROFILE_COLUMNS: &str =
    "id, name, width, height, quality, include_horizontal, include_vertical, created_at";

impl ProfileStore for SqliteStore {
    async fn add_profile(&self, profile: NewProfile) -> Result<i64, sqlx::Error> {
        let created_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO resize_profiles (name, width, height, quality, include_horizontal, include_vertical, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&profile.name)
        .bind(profile.width)
        .bind(profile.height)
        .bind(profile.quality)
        .bind(profile.include_horizontal)
        .bind(profile.include_vertical)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, sqlx::Error> {
        let rows: Vec<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM resize_profiles ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(profile_from_row).collect())
    }

    async fn get_profile(&self, id: i64) -> Result<Option<ProfileRecord>, sqlx::Error> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM resize_profiles WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(profile_from_row))
    }

    async fn update_profile(&self, id: i64, profile: NewProfile) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resize_profiles SET name = ?1, width = ?2, height = ?3, quality = ?4, \
             include_horizontal = ?5, include_vertical = ?6 WHERE id = ?7",
        )
        .bind(&profile.name)
        .bind(profile.width)
        .bind(profile.height)
        .bind(profile.quality)
        .bind(profile.include_horizontal)
        .bind(profile.include_vertical)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_profile(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resize_profiles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
