// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event listing commands

use crate::output::{print_events, OutputFormat};
use anyhow::Result;
use clap::Args;
use ww_events::{EventNotificationManager, NotificationConfig};

#[derive(Args)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub async fn pending(config: &NotificationConfig, args: ListArgs) -> Result<()> {
    let manager = EventNotificationManager::open(config)?;
    let events = manager.get_pending_notification_events();
    manager.close().await;

    print_events(&events, args.format, "No pending events.");
    Ok(())
}

pub async fn history(config: &NotificationConfig, args: ListArgs) -> Result<()> {
    let manager = EventNotificationManager::open(config)?;
    let events = manager.history();
    manager.close().await;

    print_events(&events, args.format, "No events recorded.");
    Ok(())
}
