// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record an incoming transaction

use anyhow::Result;
use clap::Args;
use ww_events::{EventNotificationManager, IncomingTransactionEvent, Network, NotificationConfig};

#[derive(Args)]
pub struct IngestArgs {
    /// Receiving address
    pub address: String,
    /// Network: production, test or regtest
    pub network: Network,
    /// Amount received, in the smallest unit
    pub value: u64,
    /// Hash of the funding transaction
    pub transaction_hash: String,
}

pub async fn handle(config: &NotificationConfig, args: IngestArgs) -> Result<()> {
    let manager = EventNotificationManager::open(config)?;
    let event = IncomingTransactionEvent::new(
        args.address,
        args.network,
        args.value,
        args.transaction_hash,
    );
    let key = event.key();

    if manager.find(&key).is_some() {
        println!("Already recorded {}", key);
        manager.close().await;
        return Ok(());
    }

    let result = manager.add_new_event(event).await;
    manager.close().await;
    result?;

    println!("Recorded {}", key);
    Ok(())
}
