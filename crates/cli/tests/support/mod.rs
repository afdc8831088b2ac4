// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub const ADDRESS: &str = "p6YdVrQFGfp8AuhpnaqgAVHibNVd3LxbTU";

/// Temporary directory holding one event log
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.path().join("events.json")
    }

    /// `ww --events <tmp>/events.json <args...>`
    pub fn ww(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("ww").expect("ww binary");
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--events")
            .arg(self.events_path())
            .args(args);
        cmd
    }
}
