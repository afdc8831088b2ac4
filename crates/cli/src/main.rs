// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ww - watch-only wallet incoming transaction notifications

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{confirm, events, ingest, watch};
use std::path::PathBuf;
use ww_events::NotificationConfig;

#[derive(Parser)]
#[command(
    name = "ww",
    version,
    about = "Watch-only wallet - incoming transaction notifications"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Event log file, overrides the configuration
    #[arg(long, global = true)]
    events: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List events awaiting confirmation
    Pending(events::ListArgs),
    /// List every recorded event
    History(events::ListArgs),
    /// Record an observed incoming transaction
    Ingest(ingest::IngestArgs),
    /// Confirm reception of an event
    Confirm(confirm::ConfirmArgs),
    /// Print deliveries until interrupted
    Watch(watch::WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = load_config(cli.config.as_ref(), cli.events)?;
    tracing::debug!(
        events = %config.events_path.display(),
        interval = %humantime::format_duration(config.interval),
        "configuration loaded"
    );

    match cli.command {
        Commands::Pending(args) => events::pending(&config, args).await,
        Commands::History(args) => events::history(&config, args).await,
        Commands::Ingest(args) => ingest::handle(&config, args).await,
        Commands::Confirm(args) => confirm::handle(&config, args).await,
        Commands::Watch(args) => watch::handle(config, args).await,
    }
}

fn load_config(path: Option<&PathBuf>, events: Option<PathBuf>) -> Result<NotificationConfig> {
    let config = match path {
        Some(path) => NotificationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NotificationConfig::default(),
    };

    Ok(match events {
        Some(events) => config.with_events_path(events),
        None => config,
    })
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
