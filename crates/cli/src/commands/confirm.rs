// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confirm reception of an event

use anyhow::Result;
use clap::Args;
use ww_events::{EventKey, EventNotificationManager, NotificationConfig};

#[derive(Args)]
pub struct ConfirmArgs {
    /// Receiving address
    pub address: String,
    /// Hash of the funding transaction
    pub transaction_hash: String,
    /// Amount received, in the smallest unit
    pub value: u64,
}

pub async fn handle(config: &NotificationConfig, args: ConfirmArgs) -> Result<()> {
    let manager = EventNotificationManager::open(config)?;
    let key = EventKey {
        address: args.address,
        transaction_hash: args.transaction_hash,
        value: args.value,
    };

    let result = match manager.find(&key) {
        None => {
            println!("No matching event for {}", key);
            Ok(())
        }
        Some((_, event)) if !event.is_pending() => {
            println!("Already confirmed {}", key);
            Ok(())
        }
        Some((id, _)) => manager.confirm_by_id(id).await.map(|()| {
            println!("Confirmed {}", key);
        }),
    };

    manager.close().await;
    Ok(result?)
}
