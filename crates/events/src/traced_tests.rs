// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event::Network;
use crate::listener::RecordingListener;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn event() -> IncomingTransactionEvent {
    IncomingTransactionEvent::new("pRo2xwwWF2mKC78kwUCZiYaLeVUn4yCpbo", Network::Test, 7, "tx-traced")
}

#[tokio::test]
async fn traced_listener_forwards_to_inner() {
    let inner = RecordingListener::new("inner");
    let traced = TracedListener::new("stdout", inner.clone());

    traced.on_incoming_transaction(&event()).await.unwrap();

    assert_eq!(inner.call_count(), 1);
    assert_eq!(traced.inner().call_count(), 1);
}

#[tokio::test]
async fn traced_listener_passes_errors_through() {
    let inner = RecordingListener::new("inner");
    inner.set_failing(true);
    let traced = TracedListener::new("stdout", inner);

    let result = traced.on_incoming_transaction(&event()).await;

    assert!(matches!(result, Err(DeliveryError::Unavailable(_))));
}

#[test]
fn traced_listener_logs_span_and_outcome() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedListener::new("wallet-ui", RecordingListener::new("inner"));
        traced.on_incoming_transaction(&event()).await
    });

    assert!(result.is_ok());
    assert!(
        logs.contains("listener.deliver"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("wallet-ui"), "Should log listener name. Logs:\n{}", logs);
    assert!(logs.contains("tx-traced"), "Should log tx hash. Logs:\n{}", logs);
    assert!(logs.contains("delivered"), "Should log completion. Logs:\n{}", logs);
}

#[test]
fn traced_listener_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let inner = RecordingListener::new("inner");
        inner.set_failing(true);
        TracedListener::new("wallet-ui", inner)
            .on_incoming_transaction(&event())
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("delivery failed"), "Should log failure. Logs:\n{}", logs);
    assert!(logs.contains("WARN"), "Failure should be a warning. Logs:\n{}", logs);
}
