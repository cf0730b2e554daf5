// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use alc_core::{Error, ExecutorProfileId, FakeClock, MetadataBag};
use alc_executors::{CreateInstanceRequest, ExecutorBackend, ExecutorRegistry};
use alc_preparers::PreparerRegistry;
use parking_lot::Mutex as PlMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Default)]
struct FakeController {
    fail_initialize: AtomicBool,
    respond_delay: PlMutex<Option<Duration>>,
    cancelled: AtomicBool,
    prompted: PlMutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ControllerClient for FakeController {
    async fn health(&self) -> Result<()> {
        Ok(())
    }

    async fn initialize(&self, _client_name: &str, _client_version: &str) -> Result<crate::controller::AgentIdentity> {
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(Error::Controller("simulated handshake failure".to_string()));
        }
        Ok(crate::controller::AgentIdentity { name: "claude-code".to_string(), version: "1.0.0".to_string() })
    }

    async fn session_new(&self, _workspace_path: &str, _mcp_servers: &[McpServerDescriptor]) -> Result<AgentSessionId> {
        Ok(AgentSessionId::new("agent-session-1"))
    }

    async fn session_load(&self, agent_session_id: &AgentSessionId) -> Result<()> {
        let _ = agent_session_id;
        Ok(())
    }

    async fn prompt(&self, text: &str) -> Result<()> {
        self.prompted.lock().push(text.to_string());
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn respond_to_permission(&self, _pending_id: &str, _option_id: &str, _cancelled: bool) -> Result<()> {
        if let Some(delay) = *self.respond_delay.lock() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn stream_agent_events(&self, _on_event: crate::controller::AgentEventHandler) -> Result<()> {
        Ok(())
    }

    async fn stream_workspace(&self, _on_event: crate::controller::WorkspaceEventHandler) -> Result<()> {
        Ok(())
    }
}

struct FakeFactory {
    controller: Arc<FakeController>,
}

impl ControllerClientFactory for FakeFactory {
    fn connect(&self, _client: &alc_core::InstanceClient) -> Arc<dyn ControllerClient> {
        self.controller.clone()
    }
}

struct FakeBackend {
    backend_name: &'static str,
    fail_create: AtomicBool,
    stopped: AtomicBool,
}

impl FakeBackend {
    fn new(backend_name: &'static str) -> Self {
        Self { backend_name, fail_create: AtomicBool::new(false), stopped: AtomicBool::new(false) }
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for FakeBackend {
    fn name(&self) -> &str {
        self.backend_name
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        _on_progress: alc_core::ProgressCallback<'_>,
    ) -> Result<alc_core::ExecutorInstance> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Provisioning("simulated provisioning failure".to_string()));
        }
        Ok(alc_core::ExecutorInstance {
            execution_id: request.execution_id.clone(),
            task_id: request.task_id.clone(),
            session_id: request.session_id.clone(),
            backend_name: self.backend_name.to_string(),
            client: alc_core::InstanceClient { endpoint: alc_core::ControllerEndpoint::LocalPort(4100), auth_token: None },
            backend_ids: HashMap::new(),
            workspace_path: request.workspace_path.clone(),
            metadata: HashMap::new(),
        })
    }

    async fn stop_instance(&self, _instance: &alc_core::ExecutorInstance, _force: bool) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn recover_instances(&self) -> Result<Vec<alc_core::ExecutorInstance>> {
        Ok(Vec::new())
    }
}

fn test_config(permission_response_deadline: Duration) -> Arc<ManagerConfig> {
    Arc::new(ManagerConfig {
        client_name: "kandev-core".to_string(),
        client_version: "test".to_string(),
        updates_stream_barrier: Duration::from_millis(50),
        initial_prompt_deadline: Duration::from_secs(60),
        permission_response_deadline,
        stop_grace_period: Duration::from_secs(30),
        remote_status_poll_interval: Duration::from_secs(30),
        github_token: None,
        claude_code_oauth_token: None,
        gh_cli_token: None,
    })
}

fn harness(
    backend: Arc<FakeBackend>,
    controller: Arc<FakeController>,
    permission_response_deadline: Duration,
) -> (Arc<Manager<FakeClock>>, Arc<TranscriptStore>, tempfile::TempDir) {
    let mut registry = ExecutorRegistry::new();
    registry.register(backend);
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let publisher = Arc::new(EventPublisher::new(Arc::new(tx)));
    let dir = tempfile::tempdir().expect("tempdir");
    let transcript = Arc::new(TranscriptStore::new(dir.path()));
    let config = test_config(permission_response_deadline);
    let factory = Arc::new(FakeFactory { controller });
    let manager = Manager::new(
        config,
        FakeClock::new(),
        Arc::new(registry),
        Arc::new(PreparerRegistry::new()),
        publisher,
        transcript.clone(),
        factory,
    );
    (manager, transcript, dir)
}

fn start_request() -> StartAgentRequest {
    StartAgentRequest {
        task_id: TaskId::new(),
        session_id: SessionId::new("session-manager-1"),
        executor_profile_id: ExecutorProfileId::new("claude-code"),
        executor_kind: ExecutorKind::Standalone,
        workspace_path: Some("/work".to_string()),
        setup_script: None,
        credentials: HashMap::new(),
        metadata: MetadataBag::new(),
        mcp_servers: Vec::new(),
        native_resume: false,
        prior_agent_session_id: None,
        task_description: None,
    }
}

#[tokio::test]
async fn start_agent_happy_path_registers_execution_and_controller() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let execution = manager.start_agent(start_request()).await.expect("start agent");

    assert_eq!(execution.status(), ExecutionStatus::Ready);
    assert!(manager.get_execution(&execution.execution_id).is_some());
    assert!(manager.get_execution_by_session_id(&execution.session_id).is_some());
    assert_eq!(manager.list_executions().len(), 1);
    let standalone_port = execution.with_entry(|e| e.standalone_port);
    assert_eq!(standalone_port, Some(4100));
}

#[tokio::test]
async fn start_agent_unknown_backend_is_rejected_before_any_provisioning() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let mut request = start_request();
    request.executor_kind = ExecutorKind::Cloud;
    let result = manager.start_agent(request).await;

    assert!(matches!(result, Err(Error::UnknownBackend(name)) if name == "sprites-cloud"));
    assert_eq!(manager.list_executions().len(), 0);
}

#[tokio::test]
async fn start_agent_rolls_back_store_and_side_tables_on_session_init_failure() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    controller.fail_initialize.store(true, Ordering::SeqCst);
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let result = manager.start_agent(start_request()).await;

    assert!(result.is_err());
    assert_eq!(manager.list_executions().len(), 0);
}

#[tokio::test]
async fn prompt_agent_rejects_unknown_session() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let result = manager.prompt_agent(&SessionId::new("no-such-session"), "hi").await;
    assert!(matches!(result, Err(Error::SessionNotFound(_))));
}

#[tokio::test]
async fn cancel_agent_forwards_to_the_controller() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller.clone(), Duration::from_secs(5));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    manager.cancel_agent(&execution.session_id).await.expect("cancel");

    assert!(controller.cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn stop_agent_tears_down_controller_and_instance_and_publishes_stopped() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend.clone(), controller, Duration::from_secs(5));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    let session_id = execution.session_id.clone();
    manager.stop_agent(&session_id, false).await.expect("stop agent");

    assert!(backend.stopped.load(Ordering::SeqCst));
    assert!(manager.get_execution_by_session_id(&session_id).is_none());
    assert!(manager.prompt_agent(&session_id, "hi").await.is_err());
}

#[tokio::test]
async fn respond_to_permission_times_out_when_the_controller_never_answers() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    *controller.respond_delay.lock() = Some(Duration::from_millis(200));
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_millis(20));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    let result = manager.respond_to_permission(&execution.session_id, "pending-1", "accept", false).await;

    assert!(matches!(result, Err(Error::PermissionTimeout)));
}

#[tokio::test]
async fn is_agent_running_for_session_reflects_store_state() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    assert!(!manager.is_agent_running_for_session(&SessionId::new("none")));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    // `start_agent` leaves a task-less session at `Ready`, not `Running`.
    assert!(!manager.is_agent_running_for_session(&execution.session_id));

    execution.transition(ExecutionStatus::Running).expect("ready to running");
    assert!(manager.is_agent_running_for_session(&execution.session_id));
}

#[tokio::test]
async fn mark_completed_transitions_and_removes_from_the_store() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    execution.transition(ExecutionStatus::Running).expect("ready to running");

    manager.mark_completed(&execution, Some(0), "").expect("mark completed");

    assert_eq!(execution.status(), ExecutionStatus::Completed);
    assert!(manager.get_execution(&execution.execution_id).is_none());
}

#[tokio::test]
async fn mark_ready_is_a_no_op_once_already_ready() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller, Duration::from_secs(5));

    let execution = manager.start_agent(start_request()).await.expect("start agent");
    assert_eq!(execution.status(), ExecutionStatus::Ready);

    manager.mark_ready(&execution).expect("mark ready is idempotent");
    assert_eq!(execution.status(), ExecutionStatus::Ready);
}

#[tokio::test]
async fn start_agent_without_native_resume_prefixes_the_prompt_with_prior_transcript() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, transcript, _dir) = harness(backend, controller.clone(), Duration::from_secs(5));

    let session_id = SessionId::new("session-resume-1");
    let prior = alc_core::TranscriptEntry::user_message(0, "earlier instruction");
    transcript.append(&session_id, &prior).await.expect("seed transcript");

    let mut request = start_request();
    request.session_id = session_id;
    request.task_description = Some("continue the task".to_string());
    manager.start_agent(request).await.expect("start agent");

    // The detached initial prompt is spawned, not awaited; give it a
    // beat to run before inspecting what the controller received.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let prompted = controller.prompted.lock().clone();
    assert_eq!(prompted.len(), 1);
    assert!(prompted[0].contains("RESUME CONTEXT FOR CONTINUING TASK"));
    assert!(prompted[0].contains("earlier instruction"));
    assert!(prompted[0].contains("continue the task"));
}

#[tokio::test]
async fn start_agent_without_prior_transcript_sends_the_prompt_unchanged() {
    let backend = Arc::new(FakeBackend::new("standalone"));
    let controller = Arc::new(FakeController::default());
    let (manager, _transcript, _dir) = harness(backend, controller.clone(), Duration::from_secs(5));

    let mut request = start_request();
    request.task_description = Some("do the thing".to_string());
    manager.start_agent(request).await.expect("start agent");

    tokio::time::sleep(Duration::from_millis(20)).await;
    let prompted = controller.prompted.lock().clone();
    assert_eq!(prompted, vec!["do the thing".to_string()]);
}
