// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use ww_events::IncomingTransactionEvent;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One event as shown to the operator
#[derive(Serialize)]
pub struct EventRow {
    pub address: String,
    pub network: String,
    pub value: u64,
    pub transaction_hash: String,
    pub status: String,
}

impl From<&IncomingTransactionEvent> for EventRow {
    fn from(event: &IncomingTransactionEvent) -> Self {
        Self {
            address: event.address().to_string(),
            network: event.network().to_string(),
            value: event.value(),
            transaction_hash: event.transaction_hash().to_string(),
            status: event.status().to_string(),
        }
    }
}

impl fmt::Display for EventRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&columns(
            &self.address,
            &self.network,
            &self.value.to_string(),
            &self.status,
            &self.transaction_hash,
        ))
    }
}

/// Header line matching [`EventRow`]'s columns
pub fn event_header() -> String {
    columns("ADDRESS", "NETWORK", "VALUE", "STATUS", "TX")
}

fn columns(address: &str, network: &str, value: &str, status: &str, tx: &str) -> String {
    format!(
        "{:<36} {:<10} {:>16} {:<10} {}",
        address, network, value, status, tx
    )
}

/// Print a single item
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of events, or `empty` when there are none (text only)
pub fn print_events(events: &[IncomingTransactionEvent], format: OutputFormat, empty: &str) {
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("{}", empty);
                return;
            }
            println!("{}", event_header());
            for row in &rows {
                println!("{}", row);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&rows) {
                println!("{}", json);
            }
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
