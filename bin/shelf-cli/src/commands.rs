use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use serde_json::json;
use shelf_core::entities::{
    AlbumStore, AssetStore, NewProfile, ProfileStore, TaskStatus, TaskStore,
};
use shelf_core::source::AssetSource;
use shelf_core::{BroadcastNotifier, ImmichClient, Shelf, SqliteStore};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cli::{Cli, Command, DownloadArgs, ProfileArgs, ProfileCommand};
use crate::config::Config;

pub async fn dispatch(cli: Cli, cfg: &Config, store: SqliteStore) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Ping => {
            let client = immich(cfg)?;
            client.ping().await.context("Immich ping failed")?;
            println!("Connected to {}", client.base_url());
        }
        Command::Albums => {
            let client = immich(cfg)?;
            let albums = client.list_albums().await.context("could not list albums")?;
            let mut rows = Vec::with_capacity(albums.len());
            for album in albums {
                let local = store.count_downloaded_assets(&album.id).await?;
                rows.push((album, local));
            }
            if json {
                let value: Vec<_> = rows
                    .iter()
                    .map(|(a, local)| {
                        json!({
                            "id": a.id,
                            "name": a.name,
                            "asset_count": a.asset_count,
                            "local_count": local,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for (album, local) in rows {
                    println!(
                        "{}  {:<32} {:>6} remote {:>6} local",
                        album.id, album.name, album.asset_count, local
                    );
                }
            }
        }
        Command::Downloads => {
            let albums = store.list_albums().await?;
            if json {
                let value: Vec<_> = albums
                    .iter()
                    .map(|a| {
                        json!({
                            "album_id": a.album_id,
                            "album_name": a.album_name,
                            "asset_count": a.asset_count,
                            "total_size": a.total_size,
                            "output_path": a.output.file_path(),
                            "created_at": a.created_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for a in albums {
                    let path = a
                        .output
                        .file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    println!(
                        "{}  {:<32} {:>6} assets {:>12} bytes  {path}",
                        a.album_id, a.album_name, a.asset_count, a.total_size
                    );
                }
            }
        }
        Command::Download(args) => {
            let (shelf, notifier) = start(cfg, store).await?;
            let result = download_then_resize(&shelf, &notifier, &args, json).await;
            shelf.shutdown().await;
            result?;
        }
        Command::Resize(args) => {
            let (shelf, notifier) = start(cfg, store).await?;
            let result: anyhow::Result<()> = async {
                let task_id = shelf.submit_resize(&args.album_id, args.profile_id).await?;
                follow(&shelf, &notifier, &task_id, json).await
            }
            .await;
            shelf.shutdown().await;
            result?;
        }
        Command::Profiles(cmd) => profiles(cmd, &store, json).await?,
        Command::Tasks(args) => {
            let tasks = store
                .list_tasks(args.kind.map(Into::into), shelf_core::service::TASK_LIST_LIMIT)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for t in tasks {
                    println!(
                        "{}  {:<8} {:<11} {:>5}/{:<5} {}",
                        t.id,
                        t.kind.to_string(),
                        t.status.to_string(),
                        t.progress,
                        t.total,
                        t.current_step.unwrap_or_default()
                    );
                }
            }
        }
        Command::DeleteTask { task_id } => {
            let shelf = Shelf::start(store, None, Arc::new(BroadcastNotifier::default()), cfg.engine());
            let result = shelf.delete_task(&task_id).await;
            shelf.shutdown().await;
            result?;
            println!("Deleted task {task_id}");
        }
    }
    Ok(())
}

fn immich(cfg: &Config) -> anyhow::Result<ImmichClient> {
    Ok(ImmichClient::new(&cfg.immich())?)
}

/// Recover from a previous run, then start the worker.
async fn start(cfg: &Config, store: SqliteStore) -> anyhow::Result<(Shelf<SqliteStore>, Arc<BroadcastNotifier>)> {
    let interrupted = store.interrupt_running_tasks().await?;
    if interrupted > 0 {
        warn!(count = interrupted, "marked tasks from a previous run as interrupted");
    }
    let source: Option<Arc<dyn AssetSource>> = match ImmichClient::new(&cfg.immich()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Immich source unavailable");
            None
        }
    };
    let notifier = Arc::new(BroadcastNotifier::default());
    let shelf = Shelf::start(store, source, notifier.clone(), cfg.engine());
    Ok((shelf, notifier))
}

/// Download the album, then resize the fresh archive with each requested
/// profile in turn. Stops at the first task that does not complete.
async fn download_then_resize(
    shelf: &Shelf<SqliteStore>,
    notifier: &BroadcastNotifier,
    args: &DownloadArgs,
    json: bool,
) -> anyhow::Result<()> {
    let task_id = shelf
        .submit_download(&args.album_id, args.name.as_deref().unwrap_or_default())
        .await?;
    follow(shelf, notifier, &task_id, json).await?;

    for &profile_id in &args.resize {
        info!(album_id = %args.album_id, profile_id, "chaining resize");
        let task_id = shelf.submit_resize(&args.album_id, profile_id).await?;
        follow(shelf, notifier, &task_id, json).await?;
    }
    Ok(())
}

/// Print events for `task_id` until it finishes. Ctrl-C cancels the task.
async fn follow(
    shelf: &Shelf<SqliteStore>,
    notifier: &BroadcastNotifier,
    task_id: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut events = notifier.subscribe();
    let mut cancel_requested = false;

    // The task may already be done before we subscribed.
    let mut last_status = shelf
        .task(task_id)
        .await?
        .map(|t| t.status)
        .ok_or_else(|| anyhow!("task {task_id} vanished"))?;

    while !last_status.is_terminal() {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.task_id == task_id => {
                    if json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else {
                        println!("[{}] {}/{} {}", event.status, event.progress, event.total, event.message);
                    }
                    last_status = event.status;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    warn!(skipped = n, "progress output fell behind");
                    if let Some(task) = shelf.task(task_id).await? {
                        last_status = task.status;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                info!(task_id, "cancelling task");
                shelf.cancel(task_id);
                cancel_requested = true;
            }
        }
    }

    match shelf.task(task_id).await? {
        Some(task) if task.status == TaskStatus::Completed => {
            if let Some(path) = task.output_path {
                println!("Output: {path} ({} bytes)", task.output_size.unwrap_or_default());
            }
            Ok(())
        }
        Some(task) => bail!(
            "task {task_id} ended with {}: {}",
            task.status,
            task.current_step.unwrap_or_default()
        ),
        None => bail!("task {task_id} vanished"),
    }
}

async fn profiles(cmd: ProfileCommand, store: &SqliteStore, json: bool) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::List => {
            let profiles = store.list_profiles().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for p in profiles {
                    println!(
                        "{:>4}  {:<24} {}x{} q{} landscape={} portrait={}",
                        p.id, p.name, p.width, p.height, p.quality, p.include_horizontal, p.include_vertical
                    );
                }
            }
        }
        ProfileCommand::Add(args) => {
            let id = store.add_profile(new_profile(args)).await?;
            println!("Added profile {id}");
        }
        ProfileCommand::Update { id, profile } => {
            if !store.update_profile(id, new_profile(profile)).await? {
                bail!("profile {id} not found");
            }
            println!("Updated profile {id}");
        }
        ProfileCommand::Delete { id } => {
            if !store.delete_profile(id).await? {
                bail!("profile {id} not found");
            }
            println!("Deleted profile {id}");
        }
    }
    Ok(())
}

fn new_profile(args: ProfileArgs) -> NewProfile {
    NewProfile {
        name: args.name,
        width: args.width,
        height: args.height,
        quality: args.quality,
        include_horizontal: !args.no_landscape,
        include_vertical: !args.no_portrait,
    }
}
