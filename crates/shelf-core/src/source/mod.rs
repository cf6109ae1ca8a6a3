//! Remote asset source interface.
//!
//! Engines only ever talk to `dyn AssetSource`; [`ImmichClient`] is the HTTP
//! implementation used by the binary, and tests plug in instrumented fakes.

mod immich;

pub use immich::{ImmichClient, ImmichConfig};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared media kind of a remote asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetKind {
    Image,
    Video,
    Audio,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub original_file_name: String,
}

/// Album metadata plus its full asset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub name: String,
    pub assets: Vec<AssetRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    pub asset_count: i64,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// URL or API key missing.
    #[error("asset source is not configured: {0}")]
    NotConfigured(&'static str),

    /// The server rejected the API key.
    #[error("the provided API key is invalid")]
    Unauthorized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("unexpected response: {message}")]
    InvalidResponse { message: String },
}

/// A remote photo library.
#[async_trait]
pub trait AssetSource: Send + Sync + 'static {
    /// Check connectivity and credentials.
    async fn ping(&self) -> Result<(), SourceError>;

    async fn list_albums(&self) -> Result<Vec<AlbumSummary>, SourceError>;

    async fn resolve_album(&self, album_id: &str) -> Result<RemoteAlbum, SourceError>;

    /// Original bytes of a single asset.
    async fn fetch_asset(&self, asset_id: &str) -> Result<Bytes, SourceError>;
}
