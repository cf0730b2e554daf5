// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn snapshot_is_an_independent_deep_copy() {
    let mut original = RemoteStatus {
        backend_name: "sprites-cloud".into(),
        remote_name: "sandbox-1".into(),
        state: "running".into(),
        created_at_ms: 1,
        last_checked_at_ms: 1,
        error_message: None,
        details: HashMap::new(),
    };
    let snap = original.snapshot();
    original.details.insert("region".into(), "us-east".into());
    original.state = "stopped".into();

    assert!(snap.details.is_empty());
    assert_eq!(snap.state, "running");
}
