// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-visible reports from the notification subsystem
//!
//! Every report is logged through `tracing`. When a channel is attached,
//! reports are also forwarded to it so embedders can surface them.

use crate::event::EventKey;
use crate::listener::ListenerId;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// A condition an operator should know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Stored events could not be read at startup; the manager started empty
    LoadFailed {
        error: String,
        quarantined: Option<PathBuf>,
    },
    /// Writing the event log failed; it will be retried
    PersistFailed { error: String },
    /// A previously failed write has now succeeded
    PersistRecovered,
    /// A listener returned an error for an event
    DeliveryFailed {
        listener: ListenerId,
        event: EventKey,
        error: String,
    },
}

/// Sender half for diagnostic delivery
pub type DiagnosticSender = mpsc::UnboundedSender<Diagnostic>;
/// Receiver half for diagnostic delivery
pub type DiagnosticReceiver = mpsc::UnboundedReceiver<Diagnostic>;

/// Shared sink for [`Diagnostic`] reports
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Arc<RwLock<Option<DiagnosticSender>>>,
}

impl Diagnostics {
    /// Log-only diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics that also forward to the returned receiver
    pub fn channel() -> (Self, DiagnosticReceiver) {
        let diagnostics = Self::new();
        let rx = diagnostics.attach();
        (diagnostics, rx)
    }

    /// Attach a new receiver, replacing any previous one
    pub fn attach(&self) -> DiagnosticReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = self.sink.write().unwrap_or_else(|e| e.into_inner());
        *sink = Some(tx);
        rx
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::LoadFailed { error, quarantined } => tracing::warn!(
                error = %error,
                quarantined = ?quarantined,
                "could not load stored events, starting empty"
            ),
            Diagnostic::PersistFailed { error } => {
                tracing::warn!(error = %error, "failed to persist events, will retry")
            }
            Diagnostic::PersistRecovered => tracing::info!("event log persisted after earlier failure"),
            Diagnostic::DeliveryFailed {
                listener,
                event,
                error,
            } => tracing::warn!(
                listener = %listener,
                event = %event,
                error = %error,
                "listener failed to handle event"
            ),
        }

        if let Some(tx) = self
            .sink
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            let _ = tx.send(diagnostic);
        }
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
