#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use tracing_test::traced_test;

    use crate::archive::{ArchiveReader, ArchiveWriter};
    use crate::config::EngineConfig;
    use crate::engine::{start_download, start_resize, EngineRunner, TaskScope};
    use crate::entities::test_support::store_in;
    use crate::entities::{
        AlbumStore, ArchiveOutput, AssetStore, NewDownloadedAlbum, NewProfile, ProfileStore, SqliteStore,
        TaskKind, TaskRecord, TaskStatus, TaskStore,
    };
    use crate::notify::{ProgressEvent, ProgressNotifier};
    use crate::runtime::{CancelRegistry, CancelSignal, Job, JobRunner, WorkItem};
    use crate::source::{AlbumSummary, AssetKind, AssetRecord, AssetSource, RemoteAlbum, SourceError};

    // ── Fakes ─────────────────────────────────────────────────────────────────

    /// In-memory asset source that counts fetches and concurrent transfers.
    #[derive(Default)]
    struct FakeSource {
        albums: HashMap<String, RemoteAlbum>,
        blobs: HashMap<String, Bytes>,
        failing: HashSet<String>,
        delay: Duration,
        fetches: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl FakeSource {
        fn with_album(mut self, album_id: &str, assets: Vec<(AssetRecord, Bytes)>) -> Self {
            let records = assets
                .into_iter()
                .map(|(record, data)| {
                    self.blobs.insert(record.id.clone(), data);
                    record
                })
                .collect();
            self.albums.insert(
                album_id.to_owned(),
                RemoteAlbum {
                    name: format!("Album {album_id}"),
                    assets: records,
                },
            );
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetSource for FakeSource {
        async fn ping(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn list_albums(&self) -> Result<Vec<AlbumSummary>, SourceError> {
            Ok(self
                .albums
                .iter()
                .map(|(id, album)| AlbumSummary {
                    id: id.clone(),
                    name: album.name.clone(),
                    asset_count: album.assets.len() as i64,
                })
                .collect())
        }

        async fn resolve_album(&self, album_id: &str) -> Result<RemoteAlbum, SourceError> {
            self.albums.get(album_id).cloned().ok_or(SourceError::Status {
                status: 404,
                url: format!("/albums/{album_id}"),
            })
        }

        async fn fetch_asset(&self, asset_id: &str) -> Result<Bytes, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(&self.in_flight);
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;

            if self.failing.contains(asset_id) {
                return Err(SourceError::Status {
                    status: 500,
                    url: format!("/assets/{asset_id}/original"),
                });
            }
            self.blobs.get(asset_id).cloned().ok_or(SourceError::Status {
                status: 404,
                url: format!("/assets/{asset_id}/original"),
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingNotifier {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressNotifier for RecordingNotifier {
        fn notify(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn png(width: u32, height: u32) -> Bytes {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    fn image_asset(id: &str) -> (AssetRecord, Bytes) {
        (
            AssetRecord {
                id: id.to_owned(),
                kind: AssetKind::Image,
                original_file_name: format!("{id}.png"),
            },
            png(8, 6),
        )
    }

    fn images(n: usize) -> Vec<(AssetRecord, Bytes)> {
        (0..n).map(|i| image_asset(&format!("asset-{i}"))).collect()
    }

    struct Harness {
        _dir: tempfile::TempDir,
        scope: TaskScope<SqliteStore>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn harness(source: Option<Arc<FakeSource>>, config: EngineConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let config = EngineConfig {
            download_root: dir.path().join("downloads"),
            resize_root: dir.path().join("resized"),
            ..config
        };
        Harness {
            scope: TaskScope {
                store,
                source: source.map(|s| s as Arc<dyn AssetSource>),
                notifier: notifier.clone(),
                config: Arc::new(config),
            },
            notifier,
            _dir: dir,
        }
    }

    impl Harness {
        fn store(&self) -> &SqliteStore {
            &self.scope.store
        }

        async fn new_task(&self, id: &str, kind: TaskKind) {
            self.store().insert_task(TaskRecord::pending(id, kind, None)).await.unwrap();
        }

        async fn download(&self, task_id: &str, album_id: &str) -> TaskRecord {
            self.new_task(task_id, TaskKind::Download).await;
            start_download(&self.scope, task_id, album_id, "", &CancelSignal::never())
                .await
                .unwrap();
            self.store().get_task(task_id).await.unwrap().unwrap()
        }

        async fn seed_archive(&self, album_id: &str, entries: Vec<(&str, Bytes)>) {
            let path = self.scope.config.download_root.join(format!("seed-{album_id}.zip"));
            let writer = ArchiveWriter::create(&path).await.unwrap();
            for (name, data) in entries {
                writer.append(name, name, data).await.unwrap();
            }
            let summary = writer.finish().await.unwrap();
            self.store()
                .replace_album(NewDownloadedAlbum {
                    album_id: album_id.into(),
                    album_name: "Seeded".into(),
                    asset_count: summary.entries as i64,
                    total_size: summary.bytes as i64,
                    output: ArchiveOutput::FilePath(path),
                })
                .await
                .unwrap();
        }

        async fn profile(&self, include_horizontal: bool, include_vertical: bool) -> i64 {
            self.store()
                .add_profile(NewProfile {
                    name: format!("p-{include_horizontal}-{include_vertical}"),
                    width: 40,
                    height: 30,
                    quality: 80,
                    include_horizontal,
                    include_vertical,
                })
                .await
                .unwrap()
        }
    }

    async fn entry_count(path: &Path) -> usize {
        ArchiveReader::open(path).await.unwrap().len()
    }

    // ── Download engine ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn download_is_idempotent_across_runs() {
        let source = Arc::new(FakeSource::default().with_album("album", images(2)));
        let h = harness(Some(source.clone()), EngineConfig::default()).await;

        let first = h.download("t1", "album").await;
        assert_eq!(first.status, TaskStatus::Completed);
        assert_eq!((first.progress, first.total), (2, 2));
        assert!(first.completed_at.is_some());
        let first_path = h.scope.config.download_path("t1");
        assert_eq!(first.output_path.as_deref(), Some(&*first_path.to_string_lossy()));
        assert_eq!(entry_count(&first_path).await, 2);
        assert_eq!(source.fetches(), 2);

        let second = h.download("t2", "album").await;
        assert_eq!(second.status, TaskStatus::Completed);
        assert_eq!((second.progress, second.total), (0, 0));
        assert_eq!(source.fetches(), 2, "nothing refetched");
        let second_path = h.scope.config.download_path("t2");
        assert_eq!(entry_count(&second_path).await, 0);

        let album = h.store().get_album("album").await.unwrap().unwrap();
        assert_eq!(album.output, ArchiveOutput::FilePath(second_path));
        assert_eq!(album.asset_count, 0);
        assert_eq!(h.store().list_albums().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn download_fetches_only_the_delta() {
        let source = Arc::new(FakeSource::default().with_album("album", images(7)));
        let h = harness(Some(source.clone()), EngineConfig::default()).await;
        for id in ["asset-1", "asset-4", "asset-6"] {
            h.store().record_downloaded_asset("album", id).await.unwrap();
        }

        let task = h.download("t", "album").await;
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(source.fetches(), 4);
        assert_eq!(entry_count(&h.scope.config.download_path("t")).await, 4);
        assert_eq!(h.store().count_downloaded_assets("album").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn download_ignores_non_image_assets() {
        let mut assets = images(2);
        assets.push((
            AssetRecord {
                id: "clip".into(),
                kind: AssetKind::Video,
                original_file_name: "clip.mp4".into(),
            },
            Bytes::from_static(b"video"),
        ));
        let source = Arc::new(FakeSource::default().with_album("album", assets));
        let h = harness(Some(source.clone()), EngineConfig::default()).await;

        let task = h.download("t", "album").await;
        assert_eq!(task.total, 2);
        assert_eq!(source.fetches(), 2);
        assert!(!h.store().downloaded_asset_ids("album").await.unwrap().contains("clip"));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_fetches_are_skipped_not_fatal() {
        let mut source = FakeSource::default().with_album("album", images(4));
        source.failing.insert("asset-2".into());
        let source = Arc::new(source);
        let h = harness(Some(source.clone()), EngineConfig::default()).await;

        let task = h.download("t", "album").await;
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!((task.progress, task.total), (4, 4));
        assert_eq!(entry_count(&h.scope.config.download_path("t")).await, 3);
        assert!(!h.store().downloaded_asset_ids("album").await.unwrap().contains("asset-2"));
        assert!(task.current_step.unwrap().contains("1 failed"));
        assert!(logs_contain("asset fetch failed"));

        // The failed asset is retried by the next sync.
        let retry = h.download("t2", "album").await;
        assert_eq!(retry.total, 1);
    }

    #[tokio::test]
    async fn download_never_exceeds_the_fetch_cap() {
        let mut source = FakeSource::default().with_album("album", images(24));
        source.delay = Duration::from_millis(15);
        let source = Arc::new(source);
        let config = EngineConfig {
            max_concurrent_fetches: 3,
            chunk_size: 10,
            ..EngineConfig::default()
        };
        let h = harness(Some(source.clone()), config).await;

        let task = h.download("t", "album").await;
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(source.fetches(), 24);
        let peak = source.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded cap");
        assert!(peak > 1, "fetches should overlap");
    }

    #[tokio::test]
    async fn progress_events_never_go_backwards() {
        let mut source = FakeSource::default().with_album("album", images(25));
        source.delay = Duration::from_millis(2);
        let h = harness(Some(Arc::new(source)), EngineConfig::default()).await;

        h.download("t", "album").await;
        let events = h.notifier.events();
        assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
        let last = events.last().unwrap();
        assert_eq!(last.status, TaskStatus::Completed);
        assert_eq!((last.progress, last.total), (25, 25));
        // Start, every 10th item, the final item and the closing report.
        assert!(events.iter().any(|e| e.progress == 10));
        assert!(events.iter().any(|e| e.progress == 20));
    }

    #[tokio::test]
    async fn cancelled_download_leaves_no_archive() {
        let mut source = FakeSource::default().with_album("album", images(6));
        source.delay = Duration::from_secs(30);
        let source = Arc::new(source);
        let h = harness(Some(source.clone()), EngineConfig::default()).await;
        h.new_task("t", TaskKind::Download).await;

        let registry = CancelRegistry::new();
        let cancel = registry.register("t");
        let run = start_download(&h.scope, "t", "album", "", &cancel);
        let trip = async {
            while source.fetches() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert!(registry.cancel("t"));
        };
        let (result, ()) = tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, trip) })
            .await
            .expect("cancellation is prompt");
        result.unwrap();

        let task = h.store().get_task("t").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.current_step.as_deref(), Some("Download cancelled"));
        assert!(!h.scope.config.download_path("t").exists());
        assert!(h.store().get_album("album").await.unwrap().is_none());
        assert_eq!(h.notifier.events().last().unwrap().status, TaskStatus::Error);
    }

    #[tokio::test]
    async fn cancelled_download_forgets_markers_it_recorded() {
        let mut source = FakeSource::default().with_album("album", images(6));
        source.delay = Duration::from_millis(20);
        let source = Arc::new(source);
        let config = EngineConfig {
            max_concurrent_fetches: 1,
            ..EngineConfig::default()
        };
        let h = harness(Some(source.clone()), config).await;
        // Archived by an earlier, completed run.
        h.store().record_downloaded_asset("album", "asset-5").await.unwrap();
        h.new_task("t", TaskKind::Download).await;

        let registry = CancelRegistry::new();
        let cancel = registry.register("t");
        let run = start_download(&h.scope, "t", "album", "", &cancel);
        let trip = async {
            while h.store().count_downloaded_assets("album").await.unwrap() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert!(registry.cancel("t"));
        };
        let (result, ()) = tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, trip) })
            .await
            .expect("cancellation is prompt");
        result.unwrap();

        let task = h.store().get_task("t").await.unwrap().unwrap();
        assert_eq!(task.current_step.as_deref(), Some("Download cancelled"));
        assert!(!h.scope.config.download_path("t").exists());
        assert_eq!(
            h.store().downloaded_asset_ids("album").await.unwrap(),
            HashSet::from(["asset-5".to_owned()]),
            "only markers of archived assets remain"
        );

        let resync = h.download("t2", "album").await;
        assert_eq!(resync.status, TaskStatus::Completed);
        assert_eq!(resync.total, 5);
        assert_eq!(entry_count(&h.scope.config.download_path("t2")).await, 5);
        assert_eq!(h.store().count_downloaded_assets("album").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn unconfigured_source_fails_without_output() {
        let h = harness(None, EngineConfig::default()).await;
        let task = h.download("t", "album").await;
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.current_step.unwrap().contains("must be configured"));
        assert!(!h.scope.config.download_path("t").exists());
    }

    #[tokio::test]
    async fn unknown_album_fails_with_upstream_message() {
        let h = harness(Some(Arc::new(FakeSource::default())), EngineConfig::default()).await;
        let task = h.download("t", "missing").await;
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.current_step.unwrap().contains("HTTP 404"));
    }

    // ── Resize engine ─────────────────────────────────────────────────────────

    #[tokio::test]
    #[traced_test]
    async fn resize_filters_and_tolerates_bad_entries() {
        let h = harness(None, EngineConfig::default()).await;
        h.seed_archive(
            "album",
            vec![
                ("wide.png", png(64, 32)),
                ("tall.png", png(20, 50)),
                ("broken.jpg", Bytes::from_static(b"not an image")),
                ("square.png", png(30, 30)),
            ],
        )
        .await;
        let profile_id = h.profile(true, false).await;
        h.new_task("r", TaskKind::Resize).await;

        start_resize(&h.scope, "r", "album", profile_id, &CancelSignal::never())
            .await
            .unwrap();

        let task = h.store().get_task("r").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!((task.progress, task.total), (4, 4));
        assert_eq!(
            task.current_step.as_deref(),
            Some("Resized 2 of 4 images (1 skipped, 1 failed)")
        );

        let out = h.scope.config.resize_path("r");
        assert_eq!(task.output_size, Some(std::fs::metadata(&out).unwrap().len() as i64));
        let reader = ArchiveReader::open(&out).await.unwrap();
        assert_eq!(reader.len(), 2);
        for n in 0..2 {
            let (name, data) = reader.read_entry(n).await.unwrap().unwrap();
            assert!(name == "wide.png" || name == "square.png", "{name}");
            let decoded = image::load_from_memory(&data).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (40, 30));
        }
        assert!(logs_contain("entry failed to transform"));
    }

    #[tokio::test]
    async fn resize_of_empty_archive_completes_immediately() {
        let h = harness(None, EngineConfig::default()).await;
        h.seed_archive("album", Vec::new()).await;
        let profile_id = h.profile(true, true).await;
        h.new_task("r", TaskKind::Resize).await;

        start_resize(&h.scope, "r", "album", profile_id, &CancelSignal::never())
            .await
            .unwrap();

        let task = h.store().get_task("r").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.output_path.is_none());
        assert!(!h.scope.config.resize_path("r").exists());
    }

    #[tokio::test]
    async fn cancelled_resize_of_empty_archive_is_not_completed() {
        let h = harness(None, EngineConfig::default()).await;
        h.seed_archive("album", Vec::new()).await;
        let profile_id = h.profile(true, true).await;
        h.new_task("r", TaskKind::Resize).await;

        let registry = CancelRegistry::new();
        let cancel = registry.register("r");
        registry.cancel("r");
        start_resize(&h.scope, "r", "album", profile_id, &cancel).await.unwrap();

        let task = h.store().get_task("r").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.current_step.as_deref(), Some("Resize cancelled"));
    }

    #[tokio::test]
    async fn resize_reports_progress_every_ten_entries() {
        let h = harness(None, EngineConfig::default()).await;
        let names: Vec<String> = (0..25).map(|i| format!("img-{i}.png")).collect();
        h.seed_archive("album", names.iter().map(|n| (n.as_str(), png(16, 9))).collect())
            .await;
        let profile_id = h.profile(true, true).await;
        h.new_task("r", TaskKind::Resize).await;

        start_resize(&h.scope, "r", "album", profile_id, &CancelSignal::never())
            .await
            .unwrap();

        let events = h.notifier.events();
        assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
        let reported: Vec<i64> = events
            .iter()
            .filter(|e| e.status == TaskStatus::InProgress)
            .map(|e| e.progress)
            .collect();
        assert_eq!(reported, vec![0, 10, 20, 25]);
        assert!(events.iter().all(|e| e.total == 25));

        let last = events.last().unwrap();
        assert_eq!(last.status, TaskStatus::Completed);
        assert_eq!(last.progress, 25);
        assert_eq!(entry_count(&h.scope.config.resize_path("r")).await, 25);
    }

    #[tokio::test]
    async fn resize_requires_album_and_profile() {
        let h = harness(None, EngineConfig::default()).await;
        let profile_id = h.profile(true, true).await;

        h.new_task("no-album", TaskKind::Resize).await;
        start_resize(&h.scope, "no-album", "album", profile_id, &CancelSignal::never())
            .await
            .unwrap();
        let task = h.store().get_task("no-album").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.current_step.unwrap().contains("no downloaded archive"));

        h.seed_archive("album", vec![("a.png", png(4, 4))]).await;
        h.new_task("no-profile", TaskKind::Resize).await;
        start_resize(&h.scope, "no-profile", "album", 9999, &CancelSignal::never())
            .await
            .unwrap();
        let task = h.store().get_task("no-profile").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.current_step.unwrap().contains("profile 9999 not found"));
    }

    #[tokio::test]
    async fn cancelled_resize_leaves_no_archive() {
        let h = harness(None, EngineConfig::default()).await;
        h.seed_archive("album", vec![("a.png", png(16, 9)), ("b.png", png(9, 16))])
            .await;
        let profile_id = h.profile(true, true).await;
        h.new_task("r", TaskKind::Resize).await;

        let registry = CancelRegistry::new();
        let cancel = registry.register("r");
        registry.cancel("r");
        start_resize(&h.scope, "r", "album", profile_id, &cancel).await.unwrap();

        let task = h.store().get_task("r").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.current_step.as_deref(), Some("Resize cancelled"));
        assert!(!h.scope.config.resize_path("r").exists());
    }

    // ── Runner dispatch ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn runner_dispatches_by_work_item_kind() {
        let source = Arc::new(FakeSource::default().with_album("album", images(3)));
        let h = harness(Some(source.clone()), EngineConfig::default()).await;
        let profile_id = h.profile(true, true).await;
        let runner = EngineRunner::new(
            h.store().clone(),
            Some(source as Arc<dyn AssetSource>),
            h.notifier.clone(),
            Arc::clone(&h.scope.config),
        );

        h.new_task("d", TaskKind::Download).await;
        runner
            .run(Job {
                item: WorkItem::Download {
                    task_id: "d".into(),
                    album_id: "album".into(),
                    album_name: "Trip".into(),
                },
                cancel: CancelSignal::never(),
            })
            .await
            .unwrap();
        let album = h.store().get_album("album").await.unwrap().unwrap();
        assert_eq!(album.album_name, "Trip");
        assert_eq!(album.asset_count, 3);

        h.new_task("r", TaskKind::Resize).await;
        runner
            .run(Job {
                item: WorkItem::Resize {
                    task_id: "r".into(),
                    album_id: "album".into(),
                    profile_id,
                },
                cancel: CancelSignal::never(),
            })
            .await
            .unwrap();
        let task = h.store().get_task("r").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(entry_count(&h.scope.config.resize_path("r")).await, 3);
    }

    #[tokio::test]
    async fn abandoned_tasks_end_in_error_once() {
        let h = harness(None, EngineConfig::default()).await;
        let runner = EngineRunner::new(
            h.store().clone(),
            None,
            h.notifier.clone(),
            Arc::clone(&h.scope.config),
        );
        h.new_task("running", TaskKind::Download).await;
        h.store().update_progress("running", 3, 9, "Downloaded 3 of 9 assets").await.unwrap();
        h.new_task("done", TaskKind::Download).await;
        h.store()
            .set_task_status("done", TaskStatus::Completed, "finished")
            .await
            .unwrap();

        runner.abandon("running", "Task crashed unexpectedly").await.unwrap();
        runner.abandon("done", "Task crashed unexpectedly").await.unwrap();
        runner.abandon("missing", "Task crashed unexpectedly").await.unwrap();

        let task = h.store().get_task("running").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.current_step.as_deref(), Some("Task crashed unexpectedly"));
        assert!(task.completed_at.is_some());
        let done = h.store().get_task("done").await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        let events = h.notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            (events[0].task_id.as_str(), events[0].status, events[0].progress, events[0].total),
            ("running", TaskStatus::Error, 3, 9)
        );
    }
}
