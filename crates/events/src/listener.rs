// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registration and fan-out delivery

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::event::IncomingTransactionEvent;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("listener rejected event: {0}")]
    Rejected(String),
    #[error("listener unavailable: {0}")]
    Unavailable(String),
}

/// Receives incoming transaction events
///
/// A listener may see the same event more than once until it is confirmed.
#[async_trait]
pub trait IncomingTransactionListener: Send + Sync + 'static {
    async fn on_incoming_transaction(
        &self,
        event: &IncomingTransactionEvent,
    ) -> Result<(), DeliveryError>;
}

/// Handle returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

type Entry = (ListenerId, Arc<dyn IncomingTransactionListener>);

/// Registered listeners, notified in registration order
pub struct ListenerRegistry {
    listeners: Arc<RwLock<Vec<Entry>>>,
    next_id: Arc<AtomicU64>,
    diagnostics: Diagnostics,
}

impl ListenerRegistry {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            diagnostics,
        }
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn IncomingTransactionListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push((id, listener));
        tracing::debug!(listener = %id, "listener registered");
        id
    }

    /// Unregister a listener; returns false if it was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!(listener = %id, "listener removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener registered at call time.
    ///
    /// The registry lock is released before any listener runs. A failing
    /// listener is reported and skipped; the rest still receive the event.
    pub async fn notify_all(&self, event: &IncomingTransactionEvent) -> Delivery {
        let snapshot: Vec<Entry> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut delivery = Delivery::default();
        for (id, listener) in snapshot {
            match listener.on_incoming_transaction(event).await {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    delivery.failed += 1;
                    self.diagnostics.report(Diagnostic::DeliveryFailed {
                        listener: id,
                        event: event.key(),
                        error: e.to_string(),
                    });
                }
            }
        }
        delivery
    }
}

impl Clone for ListenerRegistry {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingListener;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{DeliveryError, IncomingTransactionListener};
    use crate::event::IncomingTransactionEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Listener that records every event it receives
    #[derive(Clone)]
    pub struct RecordingListener {
        name: String,
        calls: Arc<Mutex<Vec<IncomingTransactionEvent>>>,
        order_log: Option<Arc<Mutex<Vec<String>>>>,
        failing: Arc<AtomicBool>,
    }

    impl RecordingListener {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                calls: Arc::new(Mutex::new(Vec::new())),
                order_log: None,
                failing: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Append this listener's name to `log` on every call
        pub fn with_order_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
            self.order_log = Some(log);
            self
        }

        /// Make subsequent calls return an error (still recorded)
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> Vec<IncomingTransactionEvent> {
            self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
        }
    }

    #[async_trait]
    impl IncomingTransactionListener for RecordingListener {
        async fn on_incoming_transaction(
            &self,
            event: &IncomingTransactionEvent,
        ) -> Result<(), DeliveryError> {
            self.calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.clone());
            if let Some(log) = &self.order_log {
                log.lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(self.name.clone());
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(DeliveryError::Unavailable(self.name.clone()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
