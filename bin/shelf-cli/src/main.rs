//! `shelf` – command-line entry point.
//!
//! Startup order:
//! 1. Parse arguments and environment configuration.
//! 2. Initialise structured tracing.
//! 3. Open the SQLite database and run pending migrations.
//! 4. Dispatch the subcommand; `download` and `resize` start an in-process
//!    worker and follow the task until it finishes.

mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::info;

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: SHELF_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = shelf_core::SqliteStore::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. Command ─────────────────────────────────────────────────────────────
    let result = commands::dispatch(cli, &cfg, store.clone()).await;
    store.close().await;
    result
}
