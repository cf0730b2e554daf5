// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::ExecutionStore;
use alc_core::{Error, ExecutorProfileId, FakeClock, MetadataBag, SessionId, TaskId};
use parking_lot::Mutex as PlMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

fn execution() -> Arc<Execution> {
    Arc::new(Execution::new(
        ExecutionId::new(),
        TaskId::new(),
        SessionId::new("session-x"),
        ExecutorProfileId::new("claude-code"),
        "standalone",
        MetadataBag::default(),
        0,
    ))
}

#[derive(Default)]
struct FakeController {
    prompt_should_fail: AtomicBool,
    prompted: PlMutex<Vec<String>>,
    session_loaded: PlMutex<Option<String>>,
}

#[async_trait::async_trait]
impl ControllerClient for FakeController {
    async fn health(&self) -> Result<()> {
        Ok(())
    }

    async fn initialize(&self, _client_name: &str, _client_version: &str) -> Result<AgentIdentity> {
        Ok(AgentIdentity { name: "claude-code".to_string(), version: "1.0.0".to_string() })
    }

    async fn session_new(&self, _workspace_path: &str, _mcp_servers: &[McpServerDescriptor]) -> Result<AgentSessionId> {
        Ok(AgentSessionId::new("agent-session-1"))
    }

    async fn session_load(&self, agent_session_id: &AgentSessionId) -> Result<()> {
        *self.session_loaded.lock() = Some(agent_session_id.as_str().to_string());
        Ok(())
    }

    async fn prompt(&self, text: &str) -> Result<()> {
        self.prompted.lock().push(text.to_string());
        if self.prompt_should_fail.load(Ordering::SeqCst) {
            return Err(Error::Controller("simulated transport failure".to_string()));
        }
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        Ok(())
    }

    async fn respond_to_permission(&self, _pending_id: &str, _option_id: &str, _cancelled: bool) -> Result<()> {
        Ok(())
    }

    async fn stream_agent_events(&self, _on_event: AgentEventHandler) -> Result<()> {
        Ok(())
    }

    async fn stream_workspace(&self, _on_event: WorkspaceEventHandler) -> Result<()> {
        Ok(())
    }
}

fn harness() -> (Arc<SessionManager<FakeClock>>, mpsc::UnboundedReceiver<Event>, tempfile::TempDir) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let publisher = Arc::new(EventPublisher::new(Arc::new(tx)));
    let dir = tempfile::tempdir().expect("tempdir");
    let transcript = Arc::new(TranscriptStore::new(dir.path()));
    let store = Arc::new(ExecutionStore::new());
    let ingestor = Arc::new(StreamIngestor::new(publisher.clone(), transcript.clone(), store, FakeClock::new()));
    let config = Arc::new(ManagerConfig {
        client_name: "kandev-core".to_string(),
        client_version: "test".to_string(),
        updates_stream_barrier: Duration::from_millis(50),
        initial_prompt_deadline: Duration::from_secs(60),
        permission_response_deadline: Duration::from_secs(30),
        stop_grace_period: Duration::from_secs(30),
        remote_status_poll_interval: Duration::from_secs(30),
        github_token: None,
        claude_code_oauth_token: None,
        gh_cli_token: None,
    });
    let manager = Arc::new(SessionManager::new(config, FakeClock::new(), publisher, transcript, ingestor));
    (manager, rx, dir)
}

#[tokio::test]
async fn initialize_session_with_no_prior_id_calls_session_new() {
    let (manager, _rx, _dir) = harness();
    let execution = execution();
    let controller = FakeController::default();

    let request =
        SessionInitRequest { workspace_path: "/work", mcp_servers: &[], native_resume: true, prior_agent_session_id: None };
    let outcome = manager.initialize_session(&execution, &controller, request).await.expect("initialize session");

    assert_eq!(outcome.agent_session_id.as_str(), "agent-session-1");
    assert!(controller.session_loaded.lock().is_none());
    assert_eq!(execution.status(), ExecutionStatus::Ready);
    let stored = execution.with_entry(|e| e.agent_session_id.clone());
    assert_eq!(stored.unwrap().as_str(), "agent-session-1");
}

#[tokio::test]
async fn initialize_session_with_native_resume_calls_session_load() {
    let (manager, _rx, _dir) = harness();
    let execution = execution();
    let controller = FakeController::default();
    let prior = AgentSessionId::new("agent-session-prior");

    let request =
        SessionInitRequest { workspace_path: "/work", mcp_servers: &[], native_resume: true, prior_agent_session_id: Some(&prior) };
    let outcome = manager.initialize_session(&execution, &controller, request).await.expect("initialize session");

    assert_eq!(outcome.agent_session_id.as_str(), "agent-session-prior");
    assert_eq!(controller.session_loaded.lock().clone().unwrap(), "agent-session-prior");
}

#[tokio::test]
async fn send_prompt_transitions_to_running_and_waits_for_stream_completion() {
    let (manager, mut rx, _dir) = harness();
    let execution = execution();
    execution.transition(ExecutionStatus::Ready).expect("starting to ready");
    let controller: Arc<dyn ControllerClient> = Arc::new(FakeController::default());

    let manager_for_send = manager.clone();
    let execution_for_send = execution.clone();
    let controller_for_send = controller.clone();
    let send = tokio::spawn(async move {
        manager_for_send.send_prompt(&execution_for_send, &controller_for_send, "do the thing", true).await
    });

    // `prompt()` itself already returned; nothing completes this turn until
    // the agent-event stream's `complete` signal arrives, simulated here.
    while execution.status() != ExecutionStatus::Running {
        tokio::task::yield_now().await;
    }
    manager.ingestor.complete_turn(&execution, false, None).await.expect("complete turn");

    let outcome =
        tokio::time::timeout(Duration::from_secs(2), send).await.expect("send_prompt did not hang").expect("task joined").expect("send_prompt result");
    assert!(!outcome.is_error);
    assert!(matches!(rx.recv().await, Some(Event::AgentReady { .. })));
}

#[tokio::test]
async fn send_prompt_rejects_invalid_status_when_validated() {
    let (manager, _rx, _dir) = harness();
    let execution = execution();
    let controller: Arc<dyn ControllerClient> = Arc::new(FakeController::default());

    let result = manager.send_prompt(&execution, &controller, "hello", true).await;
    assert!(matches!(result, Err(Error::InvalidTransition { .. })));
}

#[tokio::test]
async fn send_prompt_falls_back_to_complete_turn_on_transport_failure() {
    let (manager, mut rx, _dir) = harness();
    let execution = execution();
    execution.transition(ExecutionStatus::Ready).expect("starting to ready");
    let fake = FakeController::default();
    fake.prompt_should_fail.store(true, Ordering::SeqCst);
    let controller: Arc<dyn ControllerClient> = Arc::new(fake);

    let send = manager.send_prompt(&execution, &controller, "hello", false);
    let outcome = tokio::time::timeout(Duration::from_secs(2), send).await.expect("no hang").expect("result");

    assert!(outcome.is_error);
    assert_eq!(execution.status(), ExecutionStatus::Failed);
    let published = rx.recv().await.expect("failed event published");
    assert!(matches!(published, Event::AgentFailed { .. }));
}
