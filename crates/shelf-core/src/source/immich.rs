use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{AlbumSummary, AssetRecord, AssetSource, RemoteAlbum, SourceError};

const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for an Immich server.
#[derive(Debug, Clone, Default)]
pub struct ImmichConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl ImmichConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Immich REST client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct ImmichClient {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumBody {
    id: String,
    album_name: String,
    #[serde(default)]
    asset_count: Option<i64>,
    #[serde(default)]
    assets: Vec<AssetRecord>,
}

#[derive(Deserialize)]
struct PingBody {
    res: String,
}

/// Ensure the base URL ends in exactly one `/api`.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/api")
    }
}

impl ImmichClient {
    pub fn new(config: &ImmichConfig) -> Result<Self, SourceError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(SourceError::NotConfigured("Immich URL is not set"))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::NotConfigured("Immich API key is not set"))?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| SourceError::NotConfigured("Immich API key is not a valid header value"))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout.unwrap_or(ImmichConfig::DEFAULT_TIMEOUT))
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(url),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Response, SourceError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl AssetSource for ImmichClient {
    async fn ping(&self) -> Result<(), SourceError> {
        let body: PingBody = match self.get("/server/ping").await {
            Ok(resp) => resp.json().await?,
            Err(SourceError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                return Err(SourceError::Unauthorized);
            }
            Err(e) => return Err(e),
        };
        if body.res != "pong" {
            return Err(SourceError::InvalidResponse {
                message: format!("ping answered {:?} instead of \"pong\"", body.res),
            });
        }
        Ok(())
    }

    async fn list_albums(&self) -> Result<Vec<AlbumSummary>, SourceError> {
        let albums: Vec<AlbumBody> = self.get("/albums").await?.json().await?;
        Ok(albums
            .into_iter()
            .map(|a| AlbumSummary {
                asset_count: a.asset_count.unwrap_or(a.assets.len() as i64),
                id: a.id,
                name: a.album_name,
            })
            .collect())
    }

    async fn resolve_album(&self, album_id: &str) -> Result<RemoteAlbum, SourceError> {
        let album: AlbumBody = self.get(&format!("/albums/{album_id}")).await?.json().await?;
        tracing::debug!(album_id, assets = album.assets.len(), "resolved album");
        Ok(RemoteAlbum {
            name: album.album_name,
            assets: album.assets,
        })
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<Bytes, SourceError> {
        let resp = self.get(&format!("/assets/{asset_id}/original")).await?;
        Ok(resp.bytes().await?)
    }
}
