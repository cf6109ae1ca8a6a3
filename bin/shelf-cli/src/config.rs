//! CLI configuration, loaded from environment variables at startup.

use std::path::PathBuf;

use shelf_core::{EngineConfig, ImmichConfig};

/// Runtime configuration for the `shelf` binary.
///
/// Every field has a default so only the Immich connection needs to be set.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx SQLite URL (default: `"sqlite://shelf.db"`).
    pub database_url: String,

    /// Immich server URL; `/api` is appended when missing.
    pub immich_url: Option<String>,

    pub immich_api_key: Option<String>,

    pub download_dir: PathBuf,

    pub resize_dir: PathBuf,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    pub queue_capacity: usize,

    pub fetch_concurrency: usize,

    pub chunk_size: usize,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        Self {
            database_url: env_or("SHELF_DATABASE_URL", "sqlite://shelf.db"),
            immich_url: env_opt("SHELF_IMMICH_URL"),
            immich_api_key: env_opt("SHELF_IMMICH_API_KEY"),
            download_dir: PathBuf::from(env_or("SHELF_DOWNLOAD_DIR", "downloads")),
            resize_dir: PathBuf::from(env_or("SHELF_RESIZE_DIR", "resized")),
            log_level: env_or("SHELF_LOG", "info"),
            log_json: std::env::var("SHELF_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            queue_capacity: parse_env("SHELF_QUEUE_CAPACITY", defaults.queue_capacity),
            fetch_concurrency: parse_env("SHELF_FETCH_CONCURRENCY", defaults.max_concurrent_fetches),
            chunk_size: parse_env("SHELF_CHUNK_SIZE", defaults.chunk_size),
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            download_root: self.download_dir.clone(),
            resize_root: self.resize_dir.clone(),
            chunk_size: self.chunk_size,
            max_concurrent_fetches: self.fetch_concurrency,
            queue_capacity: self.queue_capacity,
            ..EngineConfig::default()
        }
    }

    pub fn immich(&self) -> ImmichConfig {
        ImmichConfig {
            url: self.immich_url.clone(),
            api_key: self.immich_api_key.clone(),
            timeout: Some(ImmichConfig::DEFAULT_TIMEOUT),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
