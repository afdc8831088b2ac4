// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event notification manager
//!
//! Accepts incoming transaction events from the chain watcher, persists
//! them, pushes them to listeners and keeps redelivering them through the
//! [`NotificationAgent`] until a consumer confirms them.
//!
//! All reads and writes of the event collection, including saves, happen
//! under one mutex. Listeners always run after that mutex is released.

use crate::agent::{AgentError, AgentState, NotificationAgent, PendingSource};
use crate::config::{ConfigError, NotificationConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::event::{EventId, EventKey, IncomingTransactionEvent, Network};
use crate::listener::{IncomingTransactionListener, ListenerId, ListenerRegistry};
use crate::store::{EventStore, JsonFileStore, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Events in arrival order plus an identity index.
///
/// Events are never removed, so an index into `events` is a stable handle.
#[derive(Default)]
struct Ledger {
    events: Vec<IncomingTransactionEvent>,
    index: HashMap<EventKey, EventId>,
    /// Last save failed and must be retried
    dirty: bool,
}

impl Ledger {
    /// Merge events read from the store.
    ///
    /// Unknown events are appended, so existing handles stay valid. A
    /// completed copy completes the known event; nothing is ever reopened.
    /// Returns how many events were added or completed.
    fn absorb(&mut self, events: Vec<IncomingTransactionEvent>) -> usize {
        let mut changed = 0;
        for event in events {
            match self.lookup(&event.key()) {
                Some(id) => {
                    if !event.is_pending() {
                        if let Some(existing) = self.get_mut(id) {
                            if existing.complete() {
                                changed += 1;
                            }
                        }
                    }
                }
                None => {
                    self.push(event);
                    changed += 1;
                }
            }
        }
        changed
    }

    fn push(&mut self, event: IncomingTransactionEvent) -> EventId {
        let id = EventId(self.events.len() as u64);
        self.index.insert(event.key(), id);
        self.events.push(event);
        id
    }

    fn lookup(&self, key: &EventKey) -> Option<EventId> {
        self.index.get(key).copied()
    }

    fn get(&self, id: EventId) -> Option<&IncomingTransactionEvent> {
        self.events.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: EventId) -> Option<&mut IncomingTransactionEvent> {
        self.events.get_mut(id.0 as usize)
    }

    fn pending(&self) -> Vec<IncomingTransactionEvent> {
        self.events.iter().filter(|e| e.is_pending()).cloned().collect()
    }

    fn pending_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_pending()).count()
    }
}

/// State shared between the manager and its agent.
///
/// Methods that touch the store block on file I/O; async callers run them
/// on the blocking pool.
struct Core<S> {
    store: S,
    ledger: Mutex<Ledger>,
    diagnostics: Diagnostics,
}

impl<S: EventStore> Core<S> {
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Merge the stored log into `ledger`.
    ///
    /// A corrupt log is quarantined and read as empty; returns true when
    /// that happened. Any other load failure is returned untouched.
    fn sync(&self, ledger: &mut Ledger) -> Result<bool, StorageError> {
        let (stored, quarantined) = match self.store.load() {
            Ok(events) => (events, false),
            Err(e @ StorageError::Corrupt { .. }) => {
                let moved = self.store.quarantine()?;
                self.diagnostics.report(Diagnostic::LoadFailed {
                    error: e.to_string(),
                    quarantined: moved,
                });
                (Vec::new(), true)
            }
            Err(e) => return Err(e),
        };

        let changed = ledger.absorb(stored);
        if changed > 0 {
            tracing::debug!(changed, "merged events from store");
        }
        Ok(quarantined)
    }

    /// Merge and save the whole collection under the store's write lock.
    ///
    /// Caller holds the ledger lock. The stored log is never written unless
    /// it was read first, so events written by other processes survive.
    fn persist(&self, ledger: &mut Ledger) -> Result<(), StorageError> {
        let result = self.store.lock().and_then(|_lock| {
            self.sync(ledger)?;
            self.store.save(&ledger.events)
        });

        match result {
            Ok(()) => {
                if ledger.dirty {
                    ledger.dirty = false;
                    self.diagnostics.report(Diagnostic::PersistRecovered);
                }
                Ok(())
            }
            Err(e) => {
                ledger.dirty = true;
                self.diagnostics.report(Diagnostic::PersistFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Retry an outstanding save; failures stay reported, not returned
    fn persist_if_dirty(&self, ledger: &mut Ledger) {
        if ledger.dirty {
            let _ = self.persist(ledger);
        }
    }

    /// Pick up changes from other writers, or retry a failed save
    fn reconcile(&self) -> Result<(), StorageError> {
        let mut ledger = self.ledger();
        if ledger.dirty {
            return self.persist(&mut ledger);
        }

        let quarantined = self.sync(&mut ledger).inspect_err(|e| {
            tracing::warn!(error = %e, "could not read event log, keeping events in memory");
        })?;
        if quarantined {
            return self.persist(&mut ledger);
        }
        Ok(())
    }

    /// Append `event` unless known. `None` means it was a duplicate.
    fn record(&self, event: &IncomingTransactionEvent) -> Option<Result<(), StorageError>> {
        let mut ledger = self.ledger();
        let key = event.key();
        if let Some(id) = ledger.lookup(&key) {
            tracing::debug!(event = %key, id = %id, "duplicate event ignored");
            self.persist_if_dirty(&mut ledger);
            return None;
        }

        let id = ledger.push(event.clone());
        tracing::info!(
            id = %id,
            address = event.address(),
            network = %event.network(),
            value = event.value(),
            tx = event.transaction_hash(),
            "incoming transaction recorded"
        );
        Some(self.persist(&mut ledger))
    }

    fn confirm_key(&self, key: &EventKey) -> Result<(), StorageError> {
        let mut ledger = self.ledger();
        match ledger.lookup(key) {
            Some(id) => self.confirm_locked(&mut ledger, id),
            None => {
                tracing::debug!(event = %key, "confirmation for unknown event ignored");
                self.persist_if_dirty(&mut ledger);
                Ok(())
            }
        }
    }

    fn confirm_id(&self, id: EventId) -> Result<(), StorageError> {
        let mut ledger = self.ledger();
        self.confirm_locked(&mut ledger, id)
    }

    fn confirm_locked(&self, ledger: &mut Ledger, id: EventId) -> Result<(), StorageError> {
        let completed = match ledger.get_mut(id) {
            Some(event) => event.complete(),
            None => false,
        };

        if !completed {
            tracing::debug!(id = %id, "event already confirmed or unknown");
            self.persist_if_dirty(ledger);
            return Ok(());
        }

        tracing::info!(id = %id, "event notification confirmed");
        self.persist(ledger)
    }
}

impl<S: EventStore> PendingSource for Core<S> {
    fn pending_events(&self) -> Vec<IncomingTransactionEvent> {
        self.ledger().pending()
    }

    fn refresh(&self) {
        let _ = self.reconcile();
    }
}

/// Durable, at-least-once delivery of incoming transaction events
pub struct EventNotificationManager<S: EventStore = JsonFileStore> {
    core: Arc<Core<S>>,
    registry: ListenerRegistry,
    agent: NotificationAgent,
}

impl EventNotificationManager<JsonFileStore> {
    /// Open the manager over the JSON event log named in `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &NotificationConfig) -> Result<Self, OpenError> {
        Self::open_with_diagnostics(config, Diagnostics::new())
    }

    pub fn open_with_diagnostics(
        config: &NotificationConfig,
        diagnostics: Diagnostics,
    ) -> Result<Self, OpenError> {
        config.validate()?;
        let store = JsonFileStore::new(&config.events_path);
        Ok(Self::open_with(store, config.interval, diagnostics)?)
    }
}

impl<S: EventStore> EventNotificationManager<S> {
    /// Load stored events from `store` and start redelivery.
    ///
    /// A failed load is not fatal: a [`Diagnostic::LoadFailed`] is reported
    /// and the manager starts empty. A corrupt log is quarantined first.
    /// Any other unreadable log is left in place and is not written until
    /// it can be read again.
    pub fn open_with(
        store: S,
        interval: Duration,
        diagnostics: Diagnostics,
    ) -> Result<Self, AgentError> {
        let core = Arc::new(Core {
            store,
            ledger: Mutex::new(Ledger::default()),
            diagnostics: diagnostics.clone(),
        });

        {
            let mut ledger = core.ledger();
            if let Err(e) = core.sync(&mut ledger) {
                diagnostics.report(Diagnostic::LoadFailed {
                    error: e.to_string(),
                    quarantined: None,
                });
            }
            tracing::info!(
                events = ledger.events.len(),
                pending = ledger.pending_count(),
                "event notification manager opened"
            );
        }

        let registry = ListenerRegistry::new(diagnostics);
        let agent = NotificationAgent::new(interval, registry.clone());

        let source: Arc<dyn PendingSource> = core.clone();
        agent.start(source)?;

        Ok(Self {
            core,
            registry,
            agent,
        })
    }

    /// Run `f` on the blocking pool with the shared state
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Core<S>) -> T + Send + 'static,
    {
        let core = Arc::clone(&self.core);
        Ok(tokio::task::spawn_blocking(move || f(&core)).await?)
    }

    /// Record an observed transaction; see [`Self::add_new_event`]
    pub async fn record_transaction(
        &self,
        address: impl Into<String>,
        network: Network,
        value: u64,
        transaction_hash: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.add_new_event(IncomingTransactionEvent::new(
            address,
            network,
            value,
            transaction_hash,
        ))
        .await
    }

    /// Record a new event, persist it and notify listeners.
    ///
    /// An event whose identity is already known is ignored. If the save
    /// fails the event stays recorded and is still delivered; the error is
    /// returned and the save is retried later.
    pub async fn add_new_event(
        &self,
        mut event: IncomingTransactionEvent,
    ) -> Result<(), StorageError> {
        event.reset_pending();

        let recorded = event.clone();
        let saved = match self.blocking(move |core| core.record(&recorded)).await? {
            Some(saved) => saved,
            None => return Ok(()),
        };

        self.registry.notify_all(&event).await;
        saved
    }

    /// Mark a pending event as completed so it is no longer delivered.
    ///
    /// Unknown or already completed events are ignored.
    pub async fn confirm_event_notification(
        &self,
        event: &IncomingTransactionEvent,
    ) -> Result<(), StorageError> {
        let key = event.key();
        self.blocking(move |core| core.confirm_key(&key)).await?
    }

    /// Confirm by handle; see [`Self::confirm_event_notification`]
    pub async fn confirm_by_id(&self, id: EventId) -> Result<(), StorageError> {
        self.blocking(move |core| core.confirm_id(id)).await?
    }

    /// Merge events written to the store by other processes.
    ///
    /// The agent does this on every tick; an outstanding failed save is
    /// retried instead.
    pub async fn refresh(&self) -> Result<(), StorageError> {
        self.blocking(|core| core.reconcile()).await?
    }

    /// Copy of every event still awaiting confirmation
    pub fn get_pending_notification_events(&self) -> Vec<IncomingTransactionEvent> {
        self.core.ledger().pending()
    }

    /// Copy of every event ever recorded, in arrival order
    pub fn history(&self) -> Vec<IncomingTransactionEvent> {
        self.core.ledger().events.clone()
    }

    /// Copy of the event behind `id`
    pub fn get(&self, id: EventId) -> Option<IncomingTransactionEvent> {
        self.core.ledger().get(id).cloned()
    }

    /// Look up an event by identity
    pub fn find(&self, key: &EventKey) -> Option<(EventId, IncomingTransactionEvent)> {
        let ledger = self.core.ledger();
        let id = ledger.lookup(key)?;
        ledger.get(id).map(|event| (id, event.clone()))
    }

    /// Register a listener for new and redelivered events
    pub fn add_incoming_transaction_listener(
        &self,
        listener: Arc<dyn IncomingTransactionListener>,
    ) -> ListenerId {
        self.registry.add(listener)
    }

    /// Unregister a listener; returns false if it was not registered
    pub fn remove_incoming_transaction_listener(&self, id: ListenerId) -> bool {
        self.registry.remove(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Lifecycle state of the redelivery agent
    pub fn agent_state(&self) -> AgentState {
        self.agent.state()
    }

    /// True while a failed save is waiting to be retried
    pub fn has_unsaved_changes(&self) -> bool {
        self.core.ledger().dirty
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.core.store
    }

    /// Stop redelivery and wait for the agent to exit
    pub async fn close(self) {
        self.agent.shutdown().await;
        tracing::info!("event notification manager closed");
    }
}

impl<S: EventStore> Drop for EventNotificationManager<S> {
    fn drop(&mut self) {
        self.agent.stop();
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
