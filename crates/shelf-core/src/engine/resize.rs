use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use shelf_imaging::{transform, ResizeProfile, TransformOutcome};
use tracing::{debug, error, info, warn};

use crate::archive::{remove_partial, ArchiveError, ArchiveReader, ArchiveWriter};
use crate::engine::progress::{due, ProgressReporter};
use crate::engine::{Store, TaskScope};
use crate::error::EngineError;
use crate::runtime::CancelSignal;

#[derive(Default)]
struct ResizeSummary {
    total: usize,
    processed: usize,
    skipped: usize,
    failed: usize,
}

/// Re-encode every entry of the archive downloaded for `album_id` with the
/// profile `profile_id`, writing `{resize_root}/{task_id}.zip`.
///
/// Entries are handled one at a time; a bad entry is counted and skipped.
pub async fn start_resize<S: Store>(
    scope: &TaskScope<S>,
    task_id: &str,
    album_id: &str,
    profile_id: i64,
    cancel: &CancelSignal,
) -> Result<(), EngineError> {
    let path = scope.config.resize_path(task_id);
    let reporter = ProgressReporter::new(&scope.store, scope.notifier.as_ref(), task_id);
    info!(task_id, album_id, profile_id, "resize started");

    match run_resize(scope, &reporter, task_id, album_id, profile_id, &path, cancel).await {
        Ok(summary) if summary.total == 0 => reporter.complete("Archive is empty; nothing to resize").await,
        Ok(summary) => {
            info!(
                task_id,
                processed = summary.processed,
                skipped = summary.skipped,
                failed = summary.failed,
                "resize completed"
            );
            reporter
                .complete(&format!(
                    "Resized {} of {} images ({} skipped, {} failed)",
                    summary.processed, summary.total, summary.skipped, summary.failed
                ))
                .await
        }
        Err(e) => {
            if let Err(io) = remove_partial(&path).await {
                warn!(task_id, path = %path.display(), error = %io, "could not remove partial archive");
            }
            let message = if e.is_cancelled() {
                info!(task_id, "resize cancelled");
                "Resize cancelled".to_owned()
            } else {
                error!(task_id, album_id, profile_id, error = %e, "resize failed");
                format!("Resize failed: {e}")
            };
            reporter.fail(&message).await
        }
    }
}

async fn run_resize<S: Store>(
    scope: &TaskScope<S>,
    reporter: &ProgressReporter<'_, S>,
    task_id: &str,
    album_id: &str,
    profile_id: i64,
    path: &Path,
    cancel: &CancelSignal,
) -> Result<ResizeSummary, EngineError> {
    let album = scope
        .store
        .get_album(album_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("no downloaded archive for album {album_id}")))?;
    let source_path = album.output.file_path().cloned().ok_or_else(|| {
        EngineError::NotFound(format!("album {album_id} has no archive file on disk"))
    })?;
    let profile = scope
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("resize profile {profile_id} not found")))?;
    let profile = Arc::new(profile.to_resize_profile());

    let reader = ArchiveReader::open(&source_path).await?;
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    let total = reader.len();
    let mut summary = ResizeSummary {
        total,
        ..Default::default()
    };
    if total == 0 {
        reporter.report(0, 0, "Archive is empty").await?;
        return Ok(summary);
    }

    let writer = ArchiveWriter::create(path).await?;
    reporter
        .report(0, total, &format!("Resizing {total} images to {}x{}", profile.width, profile.height))
        .await?;

    for n in 0..total {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            step = transform_entry(&reader, n, Arc::clone(&profile)) => step,
        };

        match step {
            Ok((name, TransformOutcome::Processed(bytes))) => {
                writer.append(&name, &n.to_string(), Bytes::from(bytes)).await?;
                summary.processed += 1;
            }
            Ok((name, TransformOutcome::Skip(reason))) => {
                debug!(task_id, entry = %name, %reason, "entry skipped");
                summary.skipped += 1;
            }
            Ok((name, TransformOutcome::Fail(reason))) => {
                warn!(task_id, entry = %name, %reason, "entry failed to transform");
                summary.failed += 1;
            }
            Err(e) => {
                warn!(task_id, entry = n, error = %e, "entry could not be read");
                summary.failed += 1;
            }
        }

        let done = n + 1;
        if due(done, total, scope.config.progress_interval) {
            reporter
                .report(done, total, &format!("Processed {done} of {total} images"))
                .await?;
        }
    }

    let archive = writer.finish().await?;
    scope
        .store
        .set_task_output(task_id, &archive.path.to_string_lossy(), archive.bytes as i64)
        .await?;
    Ok(summary)
}

/// Read entry `n` and transform it on a blocking thread.
async fn transform_entry(
    reader: &ArchiveReader,
    n: usize,
    profile: Arc<ResizeProfile>,
) -> Result<(String, TransformOutcome), ArchiveError> {
    let Some((name, data)) = reader.read_entry(n).await? else {
        return Err(ArchiveError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("archive entry {n} disappeared"),
        )));
    };
    let outcome = tokio::task::spawn_blocking(move || {
        let outcome = transform(&data, &name, &profile);
        (name, outcome)
    })
    .await?;
    Ok(outcome)
}
