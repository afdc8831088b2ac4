// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background redelivery of pending events
//!
//! Lifecycle: `Idle -> Running -> Stopped`. `Stopped` is terminal.

use crate::event::IncomingTransactionEvent;
use crate::listener::ListenerRegistry;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default time between redelivery passes
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Where the agent reads its work from
pub trait PendingSource: Send + Sync + 'static {
    /// Snapshot of events still awaiting confirmation
    fn pending_events(&self) -> Vec<IncomingTransactionEvent>;

    /// Bring in changes made by other writers, or retry an outstanding
    /// failed save. May block on I/O; the agent calls it on the blocking pool.
    fn refresh(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no tokio runtime available for the notification agent: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("notification agent was stopped and cannot be restarted")]
    Stopped,
}

struct AgentInner {
    state: AgentState,
    handle: Option<JoinHandle<()>>,
}

/// Periodically re-notifies listeners of every pending event
pub struct NotificationAgent {
    interval: Duration,
    registry: ListenerRegistry,
    cancel: CancellationToken,
    inner: Mutex<AgentInner>,
}

impl NotificationAgent {
    /// Create an idle agent redelivering through `registry` every `interval`
    pub fn new(interval: Duration, registry: ListenerRegistry) -> Self {
        Self {
            interval,
            registry,
            cancel: CancellationToken::new(),
            inner: Mutex::new(AgentInner {
                state: AgentState::Idle,
                handle: None,
            }),
        }
    }

    /// Time between redelivery passes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current lifecycle state
    pub fn state(&self) -> AgentState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// Spawn the redelivery loop on the current tokio runtime.
    ///
    /// Passes run every `interval`, the first one an interval after start.
    /// Calling this while already running does nothing.
    pub fn start(&self, source: Arc<dyn PendingSource>) -> Result<(), AgentError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            AgentState::Running => return Ok(()),
            AgentState::Stopped => return Err(AgentError::Stopped),
            AgentState::Idle => {}
        }

        let runtime = tokio::runtime::Handle::try_current()?;
        let handle = runtime.spawn(run(
            source,
            self.registry.clone(),
            self.interval,
            self.cancel.clone(),
        ));

        inner.state = AgentState::Running;
        inner.handle = Some(handle);
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "notification agent started");
        Ok(())
    }

    /// Request the loop to exit. Safe to call in any state, any number of times.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state == AgentState::Stopped {
            return;
        }
        let was_running = inner.state == AgentState::Running;
        inner.state = AgentState::Stopped;
        self.cancel.cancel();
        if was_running {
            tracing::info!("notification agent stopping");
        }
    }

    /// Stop the loop and wait for the task to finish
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handle
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "notification agent task ended abnormally");
            }
        }
    }
}

impl Drop for NotificationAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    source: Arc<dyn PendingSource>,
    registry: ListenerRegistry,
    interval: Duration,
    cancel: CancellationToken,
) {
    // First pass one interval after start; new events are pushed on arrival
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick(&source, &registry, &cancel) => {}
        }
    }
    tracing::debug!("notification agent exited");
}

/// One redelivery pass; returns the number of events re-notified
async fn tick(
    source: &Arc<dyn PendingSource>,
    registry: &ListenerRegistry,
    cancel: &CancellationToken,
) -> usize {
    let refresher = Arc::clone(source);
    if let Err(e) = tokio::task::spawn_blocking(move || refresher.refresh()).await {
        tracing::warn!(error = %e, "event refresh did not complete");
    }

    let pending = source.pending_events();
    if pending.is_empty() {
        return 0;
    }

    let mut notified = 0;
    for event in &pending {
        if cancel.is_cancelled() {
            break;
        }
        registry.notify_all(event).await;
        notified += 1;
    }
    tracing::debug!(pending = pending.len(), notified, "redelivery pass complete");
    notified
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
