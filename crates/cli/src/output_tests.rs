// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ww_events::Network;

fn row() -> EventRow {
    EventRow::from(&IncomingTransactionEvent::new(
        "p6YdVrQFGfp8AuhpnaqgAVHibNVd3LxbTU",
        Network::RegTest,
        500_000_000,
        "abc123",
    ))
}

#[test]
fn header_columns_line_up_with_rows() {
    let header = event_header();
    let row = row().to_string();

    assert_eq!(header.find("NETWORK"), row.find("regtest"));
    assert_eq!(header.find("STATUS"), row.find("pending"));
    assert_eq!(header.find("TX"), row.find("abc123"));
    // value is right-aligned under its heading
    assert_eq!(
        header.find("VALUE").map(|i| i + "VALUE".len()),
        row.find("500000000").map(|i| i + "500000000".len())
    );
}

#[test]
fn row_serializes_with_status_and_network_codes() {
    let json = serde_json::to_value(row()).unwrap_or_default();

    assert_eq!(json["network"], "regtest");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["value"], 500_000_000u64);
}
