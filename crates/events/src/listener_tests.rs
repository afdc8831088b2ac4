// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event::Network;
use std::sync::Mutex;

fn event() -> IncomingTransactionEvent {
    IncomingTransactionEvent::new("pRo2xwwWF2mKC78kwUCZiYaLeVUn4yCpbo", Network::Production, 42, "tx-1")
}

/// Registers another listener the first time it is called
struct RegisteringListener {
    registry: ListenerRegistry,
    late: RecordingListener,
}

#[async_trait]
impl IncomingTransactionListener for RegisteringListener {
    async fn on_incoming_transaction(
        &self,
        _event: &IncomingTransactionEvent,
    ) -> Result<(), DeliveryError> {
        self.registry.add(Arc::new(self.late.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn notifies_in_registration_order() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    registry.add(Arc::new(RecordingListener::new("l1").with_order_log(log.clone())));
    registry.add(Arc::new(RecordingListener::new("l2").with_order_log(log.clone())));
    registry.add(Arc::new(RecordingListener::new("l3").with_order_log(log.clone())));

    let delivery = registry.notify_all(&event()).await;

    assert_eq!(delivery, Delivery { delivered: 3, failed: 0 });
    assert_eq!(*log.lock().unwrap(), vec!["l1", "l2", "l3"]);
}

#[tokio::test]
async fn failing_listener_does_not_block_others() {
    let (diagnostics, mut rx) = Diagnostics::channel();
    let registry = ListenerRegistry::new(diagnostics);
    let broken = RecordingListener::new("broken");
    broken.set_failing(true);
    let healthy = RecordingListener::new("healthy");
    let broken_id = registry.add(Arc::new(broken.clone()));
    registry.add(Arc::new(healthy.clone()));

    let delivery = registry.notify_all(&event()).await;

    assert_eq!(delivery, Delivery { delivered: 1, failed: 1 });
    assert_eq!(healthy.call_count(), 1);
    match rx.try_recv().unwrap() {
        Diagnostic::DeliveryFailed {
            listener,
            event: key,
            error,
        } => {
            assert_eq!(listener, broken_id);
            assert_eq!(key, event().key());
            assert!(error.contains("broken"));
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
}

#[tokio::test]
async fn removed_listener_is_not_notified() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    let listener = RecordingListener::new("l1");
    let id = registry.add(Arc::new(listener.clone()));

    assert!(registry.remove(id));
    assert!(!registry.remove(id));
    registry.notify_all(&event()).await;

    assert_eq!(listener.call_count(), 0);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn listener_added_during_pass_waits_for_next_pass() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    let late = RecordingListener::new("late");
    registry.add(Arc::new(RegisteringListener {
        registry: registry.clone(),
        late: late.clone(),
    }));

    registry.notify_all(&event()).await;
    assert_eq!(late.call_count(), 0);
    assert_eq!(registry.len(), 2);

    registry.notify_all(&event()).await;
    assert_eq!(late.call_count(), 1);
}

#[tokio::test]
async fn empty_registry_delivers_nothing() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    assert_eq!(registry.notify_all(&event()).await, Delivery::default());
}

#[test]
fn ids_are_unique() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    let a = registry.add(Arc::new(RecordingListener::new("a")));
    let b = registry.add(Arc::new(RecordingListener::new("b")));
    assert_ne!(a, b);
}

#[test]
fn clone_shares_state() {
    let registry = ListenerRegistry::new(Diagnostics::new());
    let clone = registry.clone();

    registry.add(Arc::new(RecordingListener::new("a")));

    assert_eq!(clone.len(), 1);
}
