use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::archive::{remove_partial, ArchiveWriter};
use crate::engine::progress::{due, ProgressReporter};
use crate::engine::{Store, TaskScope};
use crate::entities::{ArchiveOutput, NewDownloadedAlbum};
use crate::error::EngineError;
use crate::runtime::CancelSignal;
use crate::source::{AssetKind, AssetRecord, AssetSource};

/// Counts for the completion message.
struct DownloadSummary {
    fetched: usize,
    failed: usize,
    delta: usize,
    already_local: usize,
}

/// Download every image of `album_id` not already recorded locally into
/// `{download_root}/{task_id}.zip`.
///
/// All failures end in the task record and the notifier; the returned error
/// only reports that recording the outcome itself failed. Markers written by
/// a run that does not complete are removed along with its partial archive.
pub async fn start_download<S: Store>(
    scope: &TaskScope<S>,
    task_id: &str,
    album_id: &str,
    album_name: &str,
    cancel: &CancelSignal,
) -> Result<(), EngineError> {
    let path = scope.config.download_path(task_id);
    let reporter = ProgressReporter::new(&scope.store, scope.notifier.as_ref(), task_id);
    info!(task_id, album_id, "download started");

    let recorded = Mutex::new(Vec::new());
    let outcome = run_download(scope, &reporter, task_id, album_id, album_name, &recorded, cancel).await;

    match outcome {
        Ok(summary) => {
            let message = if summary.delta == 0 {
                format!("Album up to date ({} assets already downloaded)", summary.already_local)
            } else {
                format!(
                    "Downloaded {} of {} new assets ({} failed)",
                    summary.fetched, summary.delta, summary.failed
                )
            };
            info!(task_id, album_id, fetched = summary.fetched, failed = summary.failed, "download completed");
            reporter.complete(&message).await
        }
        Err(e) => {
            if let Err(io) = remove_partial(&path).await {
                warn!(task_id, path = %path.display(), error = %io, "could not remove partial archive");
            }
            let recorded = recorded.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
            match scope.store.forget_downloaded_assets(album_id, &recorded).await {
                Ok(forgotten) => debug!(task_id, album_id, forgotten, "removed markers of unfinished run"),
                Err(db) => warn!(task_id, album_id, error = %db, "could not remove markers of unfinished run"),
            }
            let message = if e.is_cancelled() {
                info!(task_id, album_id, "download cancelled");
                "Download cancelled".to_owned()
            } else {
                error!(task_id, album_id, error = %e, "download failed");
                format!("Download failed: {e}")
            };
            reporter.fail(&message).await
        }
    }
}

async fn run_download<S: Store>(
    scope: &TaskScope<S>,
    reporter: &ProgressReporter<'_, S>,
    task_id: &str,
    album_id: &str,
    album_name: &str,
    recorded: &Mutex<Vec<String>>,
    cancel: &CancelSignal,
) -> Result<DownloadSummary, EngineError> {
    let source = scope.source()?;
    let config = &scope.config;

    let album = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(EngineError::Cancelled),
        album = source.resolve_album(album_id) => album?,
    };
    let album_name = if album_name.trim().is_empty() {
        album.name.as_str()
    } else {
        album_name
    };

    let local = scope.store.downloaded_asset_ids(album_id).await?;
    let images: Vec<AssetRecord> = album
        .assets
        .into_iter()
        .filter(|a| a.kind == AssetKind::Image)
        .collect();
    let already_local = images.iter().filter(|a| local.contains(&a.id)).count();
    let delta: Vec<AssetRecord> = images
        .into_iter()
        .filter(|a| !local.contains(&a.id))
        .collect();
    let total = delta.len();
    debug!(task_id, album_id, total, already_local, "computed resync delta");

    let writer = ArchiveWriter::create(config.download_path(task_id)).await?;
    reporter
        .report(0, total, &format!("Downloading {total} assets from {album_name}"))
        .await?;

    let semaphore = Semaphore::new(config.max_concurrent_fetches.max(1));
    let sink = Sink {
        writer: &writer,
        semaphore: &semaphore,
        recorded,
    };
    let done = AtomicUsize::new(0);
    let (sink, done) = (&sink, &done);
    let interval = config.progress_interval;
    let mut fetched = 0;
    let mut failed = 0;

    for chunk in delta.chunks(config.chunk_size.max(1)) {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let fetches: Vec<_> = chunk
            .iter()
            .map(|asset| async move {
                let outcome = fetch_into(scope, source, sink, album_id, asset, cancel).await;
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                if outcome.is_ok() && due(n, total, interval) {
                    reporter
                        .report(n, total, &format!("Downloaded {n} of {total} assets"))
                        .await?;
                }
                outcome
            })
            .collect();
        let results = join_all(fetches).await;

        for result in results {
            match result {
                Ok(true) => fetched += 1,
                Ok(false) => failed += 1,
                Err(e) => return Err(e),
            }
        }
    }
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let archive = writer.finish().await?;
    scope
        .store
        .replace_album(NewDownloadedAlbum {
            album_id: album_id.to_owned(),
            album_name: album_name.to_owned(),
            asset_count: archive.entries as i64,
            total_size: archive.bytes as i64,
            output: ArchiveOutput::FilePath(archive.path.clone()),
        })
        .await?;
    scope
        .store
        .set_task_output(task_id, &archive.path.to_string_lossy(), archive.bytes as i64)
        .await?;
    reporter
        .report(total, total, &format!("Downloaded {fetched} of {total} assets"))
        .await?;

    Ok(DownloadSummary {
        fetched,
        failed,
        delta: total,
        already_local,
    })
}

/// Where fetched assets go: the shared archive, behind the fetch cap, with
/// every recorded marker remembered for cleanup.
struct Sink<'a> {
    writer: &'a ArchiveWriter,
    semaphore: &'a Semaphore,
    recorded: &'a Mutex<Vec<String>>,
}

/// Fetch one asset, append it to the archive, then record its marker.
///
/// `Ok(false)` means the transfer failed and the asset was skipped.
async fn fetch_into<S: Store>(
    scope: &TaskScope<S>,
    source: &dyn AssetSource,
    sink: &Sink<'_>,
    album_id: &str,
    asset: &AssetRecord,
    cancel: &CancelSignal,
) -> Result<bool, EngineError> {
    let bytes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(EngineError::Cancelled),
        fetched = async {
            // The semaphore is never closed.
            let _permit = sink.semaphore.acquire().await;
            source.fetch_asset(&asset.id).await
        } => fetched,
    };
    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(album_id, asset_id = %asset.id, error = %e, "asset fetch failed; skipping");
            return Ok(false);
        }
    };

    let entry = sink.writer.append(&asset.original_file_name, &asset.id, bytes).await?;
    scope.store.record_downloaded_asset(album_id, &asset.id).await?;
    if let Ok(mut ids) = sink.recorded.lock() {
        ids.push(asset.id.clone());
    }
    debug!(album_id, asset_id = %asset.id, entry = %entry, "asset archived");
    Ok(true)
}
