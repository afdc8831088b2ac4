// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command handlers

pub mod confirm;
pub mod events;
pub mod ingest;
pub mod watch;
