// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::preparer::ExecutorKind;
use alc_core::{SessionId, TaskId};

fn noop_progress(_step: &str, _done: usize, _total: usize) {}

#[tokio::test]
async fn missing_paths_is_fatal() {
    let preparer = ValidatingPreparer::new();
    let request = EnvPrepareRequest::new(TaskId::new(), SessionId::new("sess-1"), ExecutorKind::Cloud);

    let err = preparer.prepare(&request, &noop_progress).await.expect_err("should fail");
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn present_workspace_path_validates_successfully() {
    let preparer = ValidatingPreparer::new();
    let mut request = EnvPrepareRequest::new(TaskId::new(), SessionId::new("sess-1"), ExecutorKind::Container);
    request.workspace_path = Some("/workspace".to_string());

    let result = preparer.prepare(&request, &noop_progress).await.expect("prepare");
    assert!(result.success);
    assert_eq!(result.steps.len(), 1);
}
