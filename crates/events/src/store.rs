// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for the event collection
//!
//! The whole collection is rewritten on every save. Writes go to a
//! temporary sibling file that is synced and then renamed over the target,
//! so readers never observe a half-written log.
//!
//! Several processes may share one log. Writers hold [`StoreLock`] across
//! their read-merge-write cycle; readers need no lock.

use crate::event::IncomingTransactionEvent;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt event log {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported event log version {found} (expected {expected})", expected = FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("storage task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Exclusive write lock on an event store, released on drop
#[must_use = "the lock is released when dropped"]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    /// A lock for stores that have no other writers
    pub fn none() -> Self {
        Self { file: None }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// Persistence backend for the manager's events
pub trait EventStore: Send + Sync + 'static {
    /// Load all events; empty if nothing has been saved yet
    fn load(&self) -> Result<Vec<IncomingTransactionEvent>, StorageError>;

    /// Replace the stored collection with `events`
    fn save(&self, events: &[IncomingTransactionEvent]) -> Result<(), StorageError>;

    /// Move unreadable data out of the way so later saves cannot clobber it.
    ///
    /// Returns where the data went, if anywhere. Earlier quarantined data
    /// is never overwritten.
    fn quarantine(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(None)
    }

    /// Block until no other writer holds the store
    fn lock(&self) -> Result<StoreLock, StorageError> {
        Ok(StoreLock::none())
    }
}

#[derive(Serialize, Deserialize)]
struct EventLogFile {
    version: u32,
    events: Vec<IncomingTransactionEvent>,
}

#[derive(Serialize)]
struct EventLogFileRef<'a> {
    version: u32,
    events: &'a [IncomingTransactionEvent],
}

/// JSON file-based event store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "tmp")
    }

    fn lock_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "lock")
    }

    /// `<file>.corrupt`, then `<file>.corrupt.1`, `<file>.corrupt.2`, ...
    fn quarantine_path(&self) -> PathBuf {
        let first = sibling_with_suffix(&self.path, "corrupt");
        let mut candidate = first.clone();
        let mut n = 0u32;
        while candidate.exists() {
            n += 1;
            candidate = sibling_with_suffix(&first, &n.to_string());
        }
        candidate
    }

    fn create_parent(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl EventStore for JsonFileStore {
    fn load(&self) -> Result<Vec<IncomingTransactionEvent>, StorageError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let file: EventLogFile =
            serde_json::from_str(&json).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if file.version != FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: file.version,
            });
        }

        Ok(file.events)
    }

    fn save(&self, events: &[IncomingTransactionEvent]) -> Result<(), StorageError> {
        self.create_parent()?;

        let json = serde_json::to_string_pretty(&EventLogFileRef {
            version: FORMAT_VERSION,
            events,
        })?;

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        // Atomic replace (rename is atomic on POSIX)
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<PathBuf>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let target = self.quarantine_path();
        fs::rename(&self.path, &target)?;
        Ok(Some(target))
    }

    fn lock(&self) -> Result<StoreLock, StorageError> {
        self.create_parent()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(StoreLock { file: Some(file) })
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventStore;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{EventStore, StorageError};
    use crate::event::IncomingTransactionEvent;
    use serde::de::Error as _;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory event store with injectable failures
    #[derive(Clone, Default)]
    pub struct FakeEventStore {
        events: Arc<Mutex<Vec<IncomingTransactionEvent>>>,
        fail_load: Arc<AtomicBool>,
        corrupt: Arc<AtomicBool>,
        fail_save: Arc<AtomicBool>,
        saves: Arc<AtomicUsize>,
        quarantined: Arc<AtomicUsize>,
    }

    impl FakeEventStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed the store as if a previous process had saved these events
        pub fn with_events(events: Vec<IncomingTransactionEvent>) -> Self {
            let store = Self::default();
            *store.events.lock().unwrap_or_else(|e| e.into_inner()) = events;
            store
        }

        /// Make loads fail with an I/O error; stored events are untouched
        pub fn set_fail_load(&self, fail: bool) {
            self.fail_load.store(fail, Ordering::SeqCst);
        }

        /// Make the stored log unreadable until it is quarantined
        pub fn set_corrupt(&self, corrupt: bool) {
            self.corrupt.store(corrupt, Ordering::SeqCst);
        }

        pub fn set_fail_save(&self, fail: bool) {
            self.fail_save.store(fail, Ordering::SeqCst);
        }

        /// Events as last successfully saved
        pub fn saved(&self) -> Vec<IncomingTransactionEvent> {
            self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        /// Number of successful saves
        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn quarantine_count(&self) -> usize {
            self.quarantined.load(Ordering::SeqCst)
        }
    }

    impl EventStore for FakeEventStore {
        fn load(&self) -> Result<Vec<IncomingTransactionEvent>, StorageError> {
            if self.fail_load.load(Ordering::SeqCst) {
                return Err(io::Error::other("permission denied").into());
            }
            if self.corrupt.load(Ordering::SeqCst) {
                return Err(StorageError::Corrupt {
                    path: PathBuf::from("fake-events.json"),
                    source: serde_json::Error::custom("unexpected end of input"),
                });
            }
            Ok(self.saved())
        }

        fn save(&self, events: &[IncomingTransactionEvent]) -> Result<(), StorageError> {
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(io::Error::other("disk full").into());
            }
            *self.events.lock().unwrap_or_else(|e| e.into_inner()) = events.to_vec();
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn quarantine(&self) -> Result<Option<PathBuf>, StorageError> {
            if !self.corrupt.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
            let n = self.quarantined.fetch_add(1, Ordering::SeqCst);
            Ok(Some(PathBuf::from(format!("fake-events.json.corrupt.{}", n))))
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
