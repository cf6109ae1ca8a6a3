use chrono::{DateTime, Utc};
use serde::Serialize;
use shelf_imaging::ResizeProfile;

/// A row in the `resize_profiles` table.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub id: i64,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub include_horizontal: bool,
    pub include_vertical: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// The transform parameters this profile describes.
    pub fn to_resize_profile(&self) -> ResizeProfile {
        ResizeProfile::new(self.width, self.height)
            .with_quality(self.quality)
            .with_orientations(self.include_horizontal, self.include_vertical)
    }
}

/// Insert / update payload for profiles.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub include_horizontal: bool,
    pub include_vertical: bool,
}
