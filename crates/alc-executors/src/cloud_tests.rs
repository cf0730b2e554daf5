// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use alc_core::{ExecutorProfileId, MetadataBag, SessionId, TaskId};
use serial_test::serial;

fn request() -> CreateInstanceRequest {
    CreateInstanceRequest {
        execution_id: ExecutionId::new(),
        task_id: TaskId::new(),
        session_id: SessionId::new("sess-1"),
        executor_profile_id: ExecutorProfileId::new("profile-1"),
        workspace_path: "/workspace".to_string(),
        credentials: HashMap::new(),
        metadata: MetadataBag::new(),
    }
}

#[test]
fn tail_lines_keeps_only_the_last_n() {
    let text = (1..=30).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
    let tail = tail_lines(&text, 20);
    assert_eq!(tail.lines().count(), 20);
    assert!(tail.starts_with("line11"));
    assert!(tail.ends_with("line30"));
}

#[test]
fn tail_lines_returns_everything_when_shorter_than_n() {
    let tail = tail_lines("a\nb\nc", 20);
    assert_eq!(tail, "a\nb\nc");
}

#[test]
fn resolve_api_token_prefers_credentials_over_metadata() {
    let mut req = request();
    req.metadata.insert("cloud.api_token", "meta-token");
    req.credentials.insert("SPRITES_API_TOKEN".to_string(), "cred-token".to_string());
    assert_eq!(resolve_api_token(&req).expect("token"), "cred-token");
}

#[test]
fn resolve_api_token_falls_back_to_metadata() {
    let mut req = request();
    req.metadata.insert("cloud.api_token", "meta-token");
    assert_eq!(resolve_api_token(&req).expect("token"), "meta-token");
}

#[test]
fn resolve_api_token_fails_fast_when_absent() {
    let err = resolve_api_token(&request()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn resolve_controller_binary_honors_env_var_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let custom = dir.path().join("custom-binary");
    std::fs::write(&custom, b"").expect("write stub binary");
    std::env::set_var(CONTROLLER_BINARY_ENV_VAR, &custom);
    let resolved = resolve_controller_binary(&request()).expect("resolved path");
    std::env::remove_var(CONTROLLER_BINARY_ENV_VAR);
    assert_eq!(resolved, custom);
}

#[test]
#[serial]
fn resolve_controller_binary_errors_when_env_var_points_nowhere() {
    std::env::set_var(CONTROLLER_BINARY_ENV_VAR, "/nonexistent/agentctl-linux-amd64");
    let err = resolve_controller_binary(&request()).unwrap_err();
    std::env::remove_var(CONTROLLER_BINARY_ENV_VAR);
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn resolve_controller_binary_honors_metadata_override() {
    let mut req = request();
    req.metadata.insert("controller.binary_override", "/opt/controllers/from-metadata");
    let resolved = resolve_controller_binary(&req).expect("resolved path");
    assert_eq!(resolved, PathBuf::from("/opt/controllers/from-metadata"));
}

#[test]
fn build_prepare_request_carries_workspace_path_and_metadata() {
    let mut req = request();
    req.metadata.insert("worktree.id", "wt-1");
    let prepared = build_prepare_request(&req);
    assert_eq!(prepared.workspace_path.as_deref(), Some("/workspace"));
    assert_eq!(prepared.metadata.get_str("worktree.id"), Some("wt-1"));
    assert_eq!(prepared.executor_kind, alc_preparers::ExecutorKind::Cloud);
}

#[tokio::test]
async fn recover_instances_is_always_empty() {
    let executor = CloudExecutor::new();
    let recovered = executor.recover_instances().await.expect("recover");
    assert!(recovered.is_empty());
}

#[tokio::test]
async fn stop_instance_fails_without_a_cached_sandbox_id() {
    let executor = CloudExecutor::new();
    let instance = ExecutorInstance {
        execution_id: ExecutionId::new(),
        task_id: TaskId::new(),
        session_id: SessionId::new("sess-1"),
        backend_name: "sprites-cloud".to_string(),
        client: InstanceClient { endpoint: ControllerEndpoint::LocalPort(0), auth_token: None },
        backend_ids: HashMap::new(),
        workspace_path: "/workspace".to_string(),
        metadata: HashMap::new(),
    };
    let err = executor.stop_instance(&instance, false).await.unwrap_err();
    assert!(matches!(err, Error::Controller(_)));
}
