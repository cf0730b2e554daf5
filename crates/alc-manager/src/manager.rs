// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root. Owns both registries, the execution store, the
//! event publisher, the remote-status poller, and the controller-client
//! side-table, and exposes the public lifecycle operations every
//! surface above this core calls into.

use crate::config::ManagerConfig;
use crate::controller::{ControllerClient, ControllerClientFactory, McpServerDescriptor};
use crate::ingestor::{self, StreamIngestor};
use crate::poller::RemoteStatusPoller;
use crate::publisher::EventPublisher;
use crate::session::{SessionInitRequest, SessionManager};
use crate::store::ExecutionStore;
use alc_core::{
    AgentSessionId, Clock, Error, Event, Execution, ExecutionId, ExecutionStatus, ExecutorInstance, ExecutorProfileId,
    MetadataBag, Result, SessionId, TaskId, TurnOutcome,
};
use alc_executors::{CreateInstanceRequest, ExecutorRegistry};
use alc_preparers::{EnvPrepareRequest, ExecutorKind, PreparerRegistry};
use alc_transcript::TranscriptStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything `StartAgent` needs beyond what the profile/backend registry
/// already knows.
pub struct StartAgentRequest {
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub executor_profile_id: ExecutorProfileId,
    pub executor_kind: ExecutorKind,
    pub workspace_path: Option<String>,
    pub setup_script: Option<String>,
    pub credentials: HashMap<String, String>,
    pub metadata: MetadataBag,
    pub mcp_servers: Vec<McpServerDescriptor>,
    pub native_resume: bool,
    pub prior_agent_session_id: Option<AgentSessionId>,
    pub task_description: Option<String>,
}

pub struct Manager<C: Clock> {
    config: Arc<ManagerConfig>,
    clock: C,
    executors: Arc<ExecutorRegistry>,
    preparers: Arc<PreparerRegistry>,
    publisher: Arc<EventPublisher>,
    transcript: Arc<TranscriptStore>,
    store: Arc<ExecutionStore>,
    session_manager: Arc<SessionManager<C>>,
    ingestor: Arc<StreamIngestor<C>>,
    poller: Arc<RemoteStatusPoller<C>>,
    controller_factory: Arc<dyn ControllerClientFactory>,
    controllers: Mutex<HashMap<ExecutionId, Arc<dyn ControllerClient>>>,
    instances: Mutex<HashMap<ExecutionId, ExecutorInstance>>,
    poller_handle: Mutex<Option<JoinHandle<()>>>,
    poller_stop: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

impl<C: Clock + 'static> Manager<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<ManagerConfig>,
        clock: C,
        executors: Arc<ExecutorRegistry>,
        preparers: Arc<PreparerRegistry>,
        publisher: Arc<EventPublisher>,
        transcript: Arc<TranscriptStore>,
        controller_factory: Arc<dyn ControllerClientFactory>,
    ) -> Arc<Self> {
        let store = Arc::new(ExecutionStore::new());
        let ingestor = Arc::new(StreamIngestor::new(publisher.clone(), transcript.clone(), store.clone(), clock.clone()));
        let session_manager =
            Arc::new(SessionManager::new(config.clone(), clock.clone(), publisher.clone(), transcript.clone(), ingestor.clone()));
        let poller =
            Arc::new(RemoteStatusPoller::new(store.clone(), executors.clone(), clock.clone(), config.remote_status_poll_interval));

        Arc::new(Self {
            config,
            clock,
            executors,
            preparers,
            publisher,
            transcript,
            store,
            session_manager,
            ingestor,
            poller,
            controller_factory,
            controllers: Mutex::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
            poller_handle: Mutex::new(None),
            poller_stop: Mutex::new(None),
        })
    }

    /// Starts the remote-status poller as a background task. Idempotent:
    /// calling this twice replaces the previous task's stop handle rather
    /// than running two pollers against the same cache.
    pub fn spawn_poller(self: &Arc<Self>, cancellation: CancellationToken) {
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
        let poller = self.poller.clone();
        let handle = tokio::spawn(async move { poller.run(stop_rx, cancellation).await });
        *self.poller_handle.lock() = Some(handle);
        *self.poller_stop.lock() = Some(stop_tx);
    }

    /// Stops the background poller task, if one is running, and waits for
    /// it to exit.
    pub async fn shutdown(&self) {
        let stop_tx = self.poller_stop.lock().take();
        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.send(());
        }
        let handle = self.poller_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Runs the preparer (if one is registered for this kind), provisions
    /// a sandbox through the executor backend, opens the controller
    /// connection, and drives the session handshake plus optional first
    /// prompt.
    pub async fn start_agent(self: &Arc<Self>, request: StartAgentRequest) -> Result<Arc<Execution>> {
        let backend_name = request.executor_kind.to_string();
        let backend = self.executors.get(&backend_name).ok_or_else(|| Error::UnknownBackend(backend_name.clone()))?;

        let mut workspace_path = request.workspace_path.clone();
        if let Some(preparer) = self.preparers.get(request.executor_kind) {
            let mut prepare_request = EnvPrepareRequest::new(request.task_id.clone(), request.session_id.clone(), request.executor_kind);
            prepare_request.workspace_path = workspace_path.clone();
            prepare_request.repository_path = request.metadata.repository_path().map(str::to_string);
            prepare_request.worktree_enabled = request.metadata.worktree_enabled();
            prepare_request.worktree_branch = request.metadata.worktree_branch().map(str::to_string);
            prepare_request.setup_script = request.setup_script.clone().or_else(|| request.metadata.setup_script().map(str::to_string));
            prepare_request.metadata = request.metadata.clone();

            let session_id = request.session_id.clone();
            let result = preparer
                .prepare(
                    &prepare_request,
                    &|step, idx, total| tracing::info!(%session_id, step, idx, total, "preparing environment"),
                )
                .await?;
            if !result.success {
                return Err(Error::Provisioning(format!("environment preparation failed for session {}", request.session_id)));
            }
            if workspace_path.is_none() {
                workspace_path = prepare_request.workspace_path;
            }
        }

        let execution_id = ExecutionId::new();
        let create_request = CreateInstanceRequest {
            execution_id: execution_id.clone(),
            task_id: request.task_id.clone(),
            session_id: request.session_id.clone(),
            executor_profile_id: request.executor_profile_id.clone(),
            workspace_path: workspace_path.clone().unwrap_or_default(),
            credentials: request.credentials.clone(),
            metadata: request.metadata.clone(),
        };
        let session_id = request.session_id.clone();
        let instance = backend
            .create_instance(&create_request, &|step, idx, total| {
                tracing::info!(%session_id, step, idx, total, "provisioning instance")
            })
            .await?;

        let now = self.clock.epoch_ms();
        let execution = Arc::new(Execution::new(
            execution_id.clone(),
            request.task_id.clone(),
            request.session_id.clone(),
            request.executor_profile_id.clone(),
            backend_name.clone(),
            request.metadata.clone(),
            now,
        ));
        execution.with_entry(|entry| {
            entry.backend_name = backend_name.clone();
            entry.workspace_path = Some(instance.workspace_path.clone());
            entry.container_id = instance.backend_ids.get("container_id").cloned();
            match &instance.client.endpoint {
                alc_core::ControllerEndpoint::LocalPort(port) => {
                    entry.standalone_instance_id = Some(execution_id.to_string());
                    entry.standalone_port = Some(*port);
                }
                alc_core::ControllerEndpoint::Socket(addr) => {
                    entry.container_ip = Some(addr.ip().to_string());
                }
            }
            entry.runtime_metadata = instance.metadata.clone();
        });
        self.store.insert(execution.clone())?;

        let controller = self.controller_factory.connect(&instance.client);
        self.controllers.lock().insert(execution_id.clone(), controller.clone());
        self.instances.lock().insert(execution_id.clone(), instance);

        self.publisher.publish(Event::AgentStarted { session_id: request.session_id.clone() });

        // Agent types that don't advertise native resume never get a
        // `session_load`; continuity instead comes from prefixing the
        // next prompt with a reconstructed transcript. A no-op for a
        // session with no prior history.
        let task_description = match request.task_description {
            Some(text) if !request.native_resume => {
                Some(alc_transcript::generate_resume_context(&self.transcript, &request.session_id, &text).await?)
            }
            other => other,
        };

        let init_request = SessionInitRequest {
            workspace_path: workspace_path.as_deref().unwrap_or(""),
            mcp_servers: &request.mcp_servers,
            native_resume: request.native_resume,
            prior_agent_session_id: request.prior_agent_session_id.as_ref(),
        };
        if let Err(e) = self
            .session_manager
            .initialize_and_prompt(execution.clone(), controller, init_request, task_description)
            .await
        {
            self.store.remove(&execution_id);
            self.controllers.lock().remove(&execution_id);
            self.instances.lock().remove(&execution_id);
            return Err(e);
        }

        Ok(execution)
    }

    pub async fn prompt_agent(&self, session_id: &SessionId, text: &str) -> Result<TurnOutcome> {
        let execution = self.store.get_by_session_id(session_id).ok_or_else(|| Error::SessionNotFound(session_id.clone()))?;
        let controller = self.controller_for(&execution.execution_id)?;
        self.session_manager.send_prompt(&execution, &controller, text, true).await
    }

    pub async fn cancel_agent(&self, session_id: &SessionId) -> Result<()> {
        let execution = self.store.get_by_session_id(session_id).ok_or_else(|| Error::SessionNotFound(session_id.clone()))?;
        let controller = self.controller_for(&execution.execution_id)?;
        controller.cancel().await
    }

    /// Tears down the sandbox and removes bookkeeping. The in-progress
    /// turn, if any, is left to resolve through its own completion path —
    /// a force stop does not synthesize a `TurnOutcome`.
    pub async fn stop_agent(&self, session_id: &SessionId, force: bool) -> Result<()> {
        let execution = self.store.get_by_session_id(session_id).ok_or_else(|| Error::SessionNotFound(session_id.clone()))?;
        let execution_id = execution.execution_id.clone();

        let controller = self.controllers.lock().remove(&execution_id);
        if let Some(controller) = controller {
            let _ = controller.cancel().await;
        }
        let instance = self.instances.lock().remove(&execution_id);
        if let Some(instance) = instance {
            let backend_name = execution.with_entry(|entry| entry.backend_name.clone());
            if let Some(backend) = self.executors.get(&backend_name) {
                backend.stop_instance(&instance, force).await?;
            }
        }

        execution.with_entry(|entry| entry.finished_at_ms = Some(self.clock.epoch_ms()));
        let _ = execution.transition(ExecutionStatus::Stopped);
        self.store.remove(&execution_id);
        self.publisher.publish(Event::AgentStopped { session_id: session_id.clone() });
        Ok(())
    }

    pub async fn respond_to_permission(&self, session_id: &SessionId, pending_id: &str, option_id: &str, cancelled: bool) -> Result<()> {
        let execution = self.store.get_by_session_id(session_id).ok_or_else(|| Error::SessionNotFound(session_id.clone()))?;
        let controller = self.controller_for(&execution.execution_id)?;
        tokio::time::timeout(self.config.permission_response_deadline, controller.respond_to_permission(pending_id, option_id, cancelled))
            .await
            .map_err(|_| Error::PermissionTimeout)?
    }

    pub fn mark_ready(&self, execution: &Arc<Execution>) -> Result<()> {
        ingestor::mark_ready(execution, &self.publisher)
    }

    pub fn mark_completed(&self, execution: &Arc<Execution>, exit_code: Option<i32>, message: impl Into<String>) -> Result<()> {
        ingestor::mark_completed(execution, &self.store, &self.publisher, &self.clock, exit_code, message)
    }

    pub fn list_executions(&self) -> Vec<Arc<Execution>> {
        self.store.list()
    }

    pub fn get_execution(&self, execution_id: &ExecutionId) -> Option<Arc<Execution>> {
        self.store.get(execution_id)
    }

    pub fn get_execution_by_session_id(&self, session_id: &SessionId) -> Option<Arc<Execution>> {
        self.store.get_by_session_id(session_id)
    }

    pub fn is_agent_running_for_session(&self, session_id: &SessionId) -> bool {
        match self.store.get_by_session_id(session_id) {
            Some(execution) => matches!(execution.status(), ExecutionStatus::Running | ExecutionStatus::Starting),
            None => false,
        }
    }

    pub fn remote_status_poller(&self) -> &Arc<RemoteStatusPoller<C>> {
        &self.poller
    }

    fn controller_for(&self, execution_id: &ExecutionId) -> Result<Arc<dyn ControllerClient>> {
        self.controllers.lock().get(execution_id).cloned().ok_or(Error::NotInitialized)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
