//! Streaming album download and letterbox resize engine.
//!
//! Work items are submitted through [`Shelf`], which records a task, places
//! the item on a bounded queue and lets a single worker loop execute it:
//!
//! - **Download** resolves a remote album, fetches every image not yet
//!   recorded locally with bounded concurrency, and streams each one into a
//!   single ZIP archive on disk.
//! - **Resize** reads a downloaded archive entry by entry, letterboxes each
//!   image with [`shelf_imaging::transform`] and streams the results into a
//!   new archive.
//!
//! Progress is persisted on the task record and pushed to a
//! [`ProgressNotifier`].

pub mod archive;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod notify;
pub mod runtime;
pub mod service;
pub mod source;

pub use config::EngineConfig;
pub use entities::SqliteStore;
pub use error::EngineError;
pub use notify::{BroadcastNotifier, ProgressEvent, ProgressNotifier};
pub use service::Shelf;
pub use source::{AssetSource, ImmichClient, ImmichConfig};
