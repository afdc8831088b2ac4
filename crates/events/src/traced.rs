// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced listener wrapper for consistent observability

use crate::event::IncomingTransactionEvent;
use crate::listener::{DeliveryError, IncomingTransactionListener};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any IncomingTransactionListener
#[derive(Clone)]
pub struct TracedListener<L> {
    name: String,
    inner: L,
}

impl<L> TracedListener<L> {
    pub fn new(name: impl Into<String>, inner: L) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: IncomingTransactionListener> IncomingTransactionListener for TracedListener<L> {
    async fn on_incoming_transaction(
        &self,
        event: &IncomingTransactionEvent,
    ) -> Result<(), DeliveryError> {
        let span = tracing::info_span!(
            "listener.deliver",
            listener = %self.name,
            tx = event.transaction_hash(),
            address = event.address(),
        );

        async {
            tracing::debug!(value = event.value(), status = %event.status(), "delivering");

            let start = std::time::Instant::now();
            let result = self.inner.on_incoming_transaction(event).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "delivered"),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "delivery failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
