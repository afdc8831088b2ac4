// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ww-events: incoming transaction notifications for the watch-only wallet
//!
//! This crate provides:
//! - `EventNotificationManager` - durable, at-least-once delivery of events
//! - `ListenerRegistry` - ordered fan-out to registered listeners
//! - `NotificationAgent` - periodic redelivery of unconfirmed events
//! - `JsonFileStore` - atomic whole-file persistence of the event log

pub mod agent;
pub mod config;
pub mod diagnostics;
pub mod event;
pub mod listener;
pub mod manager;
pub mod store;
pub mod traced;

pub use agent::{AgentError, AgentState, NotificationAgent, PendingSource, DEFAULT_INTERVAL};
pub use config::{ConfigError, NotificationConfig, DEFAULT_EVENTS_PATH};
pub use diagnostics::{Diagnostic, DiagnosticReceiver, Diagnostics};
pub use event::{EventId, EventKey, EventStatus, IncomingTransactionEvent, Network, UnknownNetwork};
pub use listener::{
    Delivery, DeliveryError, IncomingTransactionListener, ListenerId, ListenerRegistry,
};
pub use manager::{EventNotificationManager, OpenError};
pub use store::{EventStore, JsonFileStore, StorageError, StoreLock, FORMAT_VERSION};
pub use traced::TracedListener;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use listener::RecordingListener;
#[cfg(any(test, feature = "test-support"))]
pub use store::FakeEventStore;
