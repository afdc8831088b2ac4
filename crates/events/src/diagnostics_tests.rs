// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn report_without_channel_is_fine() {
    let diagnostics = Diagnostics::new();
    diagnostics.report(Diagnostic::PersistRecovered);
}

#[test]
fn channel_receives_reports() {
    let (diagnostics, mut rx) = Diagnostics::channel();

    diagnostics.report(Diagnostic::PersistFailed {
        error: "disk full".to_string(),
    });
    diagnostics.report(Diagnostic::PersistRecovered);

    assert_eq!(
        rx.try_recv().unwrap(),
        Diagnostic::PersistFailed {
            error: "disk full".to_string()
        }
    );
    assert_eq!(rx.try_recv().unwrap(), Diagnostic::PersistRecovered);
    assert!(rx.try_recv().is_err());
}

#[test]
fn clones_share_the_sink() {
    let diagnostics = Diagnostics::new();
    let clone = diagnostics.clone();
    let mut rx = diagnostics.attach();

    clone.report(Diagnostic::PersistRecovered);

    assert!(rx.try_recv().is_ok());
}

#[test]
fn attach_replaces_previous_receiver() {
    let diagnostics = Diagnostics::new();
    let mut first = diagnostics.attach();
    let mut second = diagnostics.attach();

    diagnostics.report(Diagnostic::PersistRecovered);

    assert!(first.try_recv().is_err());
    assert!(second.try_recv().is_ok());
}
