// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Print deliveries until interrupted

use crate::output::{print, EventRow, OutputFormat};
use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ww_events::{
    DeliveryError, EventNotificationManager, IncomingTransactionEvent,
    IncomingTransactionListener, NotificationConfig, TracedListener,
};

#[derive(Args)]
pub struct WatchArgs {
    /// Redelivery interval, overrides the configuration (e.g. "30s", "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Writes every delivered event to stdout
struct StdoutListener {
    format: OutputFormat,
}

#[async_trait]
impl IncomingTransactionListener for StdoutListener {
    async fn on_incoming_transaction(
        &self,
        event: &IncomingTransactionEvent,
    ) -> Result<(), DeliveryError> {
        print(&EventRow::from(event), self.format);
        Ok(())
    }
}

pub async fn handle(config: NotificationConfig, args: WatchArgs) -> Result<()> {
    let config = match args.interval {
        Some(interval) if interval.is_zero() => bail!("interval must be greater than zero"),
        Some(interval) => config.with_interval(interval),
        None => config,
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping watch...");
        signal.cancel();
    })?;

    let manager = EventNotificationManager::open(&config)?;
    let listener = TracedListener::new("stdout", StdoutListener { format: args.format });
    manager.add_incoming_transaction_listener(Arc::new(listener));

    eprintln!(
        "Watching {} (every {})",
        config.events_path.display(),
        humantime::format_duration(config.interval)
    );

    shutdown.cancelled().await;
    manager.close().await;
    Ok(())
}
