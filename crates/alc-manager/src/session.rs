// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives the in-sandbox controller's session protocol: the initialize
//! handshake, `session/new`-vs-`session/load` branching, and prompt
//! turns.

use crate::config::ManagerConfig;
use crate::controller::{AgentIdentity, ControllerClient, McpServerDescriptor};
use crate::ingestor::StreamIngestor;
use crate::publisher::EventPublisher;
use alc_core::{AgentSessionId, Clock, Error, Event, Execution, ExecutionStatus, Result, TranscriptEntry, TurnOutcome};
use alc_transcript::TranscriptStore;
use std::sync::Arc;
use std::time::Duration;

/// Parameters that vary per `InitializeSession` call; everything fixed
/// across an agent type's lifetime lives on [`ManagerConfig`] instead.
pub struct SessionInitRequest<'a> {
    pub workspace_path: &'a str,
    pub mcp_servers: &'a [McpServerDescriptor],
    pub native_resume: bool,
    pub prior_agent_session_id: Option<&'a AgentSessionId>,
}

pub struct SessionInitOutcome {
    pub identity: AgentIdentity,
    pub agent_session_id: AgentSessionId,
}

pub struct SessionManager<C: Clock> {
    config: Arc<ManagerConfig>,
    clock: C,
    publisher: Arc<EventPublisher>,
    transcript: Arc<TranscriptStore>,
    ingestor: Arc<StreamIngestor<C>>,
}

impl<C: Clock + 'static> SessionManager<C> {
    pub fn new(
        config: Arc<ManagerConfig>,
        clock: C,
        publisher: Arc<EventPublisher>,
        transcript: Arc<TranscriptStore>,
        ingestor: Arc<StreamIngestor<C>>,
    ) -> Self {
        Self { config, clock, publisher, transcript, ingestor }
    }

    /// Handshake + `session/new`-vs-`session/load`. Transitions
    /// `starting -> ready` on success.
    pub async fn initialize_session(
        &self,
        execution: &Arc<Execution>,
        controller: &dyn ControllerClient,
        request: SessionInitRequest<'_>,
    ) -> Result<SessionInitOutcome> {
        let identity = controller.initialize(&self.config.client_name, &self.config.client_version).await?;

        let agent_session_id = match (request.native_resume, request.prior_agent_session_id) {
            (true, Some(prior)) => {
                controller.session_load(prior).await?;
                prior.clone()
            }
            _ => controller.session_new(request.workspace_path, request.mcp_servers).await?,
        };

        execution.with_entry(|entry| entry.agent_session_id = Some(agent_session_id.clone()));
        execution.transition(ExecutionStatus::Ready)?;

        Ok(SessionInitOutcome { identity, agent_session_id })
    }

    /// `InitializeSession`, then publish `AgentSessionCreated`, connect
    /// both controller streams under a 5 s readiness barrier (a timeout
    /// here is a warning, not a failure), then either kick off the first
    /// prompt detached or mark the execution ready immediately.
    #[allow(clippy::too_many_arguments)]
    pub async fn initialize_and_prompt(
        self: &Arc<Self>,
        execution: Arc<Execution>,
        controller: Arc<dyn ControllerClient>,
        request: SessionInitRequest<'_>,
        task_description: Option<String>,
    ) -> Result<SessionInitOutcome> {
        let outcome = self.initialize_session(&execution, controller.as_ref(), request).await?;

        self.publisher.publish(Event::AgentSessionCreated {
            session_id: execution.session_id.clone(),
            agent_session_id: outcome.agent_session_id.as_str().to_string(),
            agent_name: outcome.identity.name.clone(),
            agent_version: outcome.identity.version.clone(),
        });

        self.connect_streams(&execution, &controller).await;

        match task_description {
            Some(text) => {
                self.clone().spawn_initial_prompt(execution, controller, text);
            }
            None => {
                crate::ingestor::mark_ready(&execution, &self.publisher)?;
            }
        }

        Ok(outcome)
    }

    async fn connect_streams(&self, execution: &Arc<Execution>, controller: &Arc<dyn ControllerClient>) {
        let agent_ingestor = self.ingestor.clone();
        let agent_execution = execution.clone();
        let agent_controller = controller.clone();
        let agent_subscribe = async move {
            agent_controller
                .stream_agent_events(Box::new(move |event| {
                    let ingestor = agent_ingestor.clone();
                    let execution = agent_execution.clone();
                    tokio::spawn(async move {
                        ingestor.handle_agent_event(&execution, event).await;
                    });
                }))
                .await
        };
        if tokio::time::timeout(self.config.updates_stream_barrier, agent_subscribe).await.is_err() {
            tracing::warn!(session_id = %execution.session_id, "timed out waiting for agent-event stream to be ready");
        }

        let workspace_ingestor = self.ingestor.clone();
        let workspace_execution = execution.clone();
        let workspace_controller = controller.clone();
        let workspace_subscribe = async move {
            workspace_controller
                .stream_workspace(Box::new(move |event| {
                    workspace_ingestor.handle_workspace_event(&workspace_execution, event);
                }))
                .await
        };
        if tokio::time::timeout(self.config.updates_stream_barrier, workspace_subscribe).await.is_err() {
            tracing::warn!(session_id = %execution.session_id, "timed out waiting for workspace stream to be ready");
        }
    }

    /// Detached first prompt: nobody is waiting on its `TurnOutcome`, so
    /// failures only get logged, bounded by a 10-minute deadline.
    fn spawn_initial_prompt(self: Arc<Self>, execution: Arc<Execution>, controller: Arc<dyn ControllerClient>, text: String) {
        let deadline = self.config.initial_prompt_deadline;
        tokio::spawn(async move {
            let send = self.send_prompt(&execution, &controller, &text, false);
            match tokio::time::timeout(deadline, send).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(session_id = %execution.session_id, "initial prompt failed: {}", e),
                Err(_) => tracing::warn!(session_id = %execution.session_id, "initial prompt timed out after {:?}", deadline),
            }
        });
    }

    /// Validates status (if requested), transitions to `running`, clears
    /// the streaming buffers, installs a fresh `promptDone` sender, then
    /// blocks on the controller call followed by that same sender's
    /// receiver — the Stream Ingestor's `complete` handling is what
    /// actually signals it.
    pub async fn send_prompt(
        &self,
        execution: &Arc<Execution>,
        controller: &Arc<dyn ControllerClient>,
        text: &str,
        validate_status: bool,
    ) -> Result<TurnOutcome> {
        if validate_status {
            let status = execution.status();
            if status != ExecutionStatus::Running && status != ExecutionStatus::Ready {
                return Err(Error::InvalidTransition { from: status.to_string(), to: ExecutionStatus::Running.to_string() });
            }
        }
        execution.transition(ExecutionStatus::Running)?;
        execution.with_streaming(|state| {
            state.message_buffer.clear();
            state.reasoning_buffer.clear();
            state.thinking_buffer.clear();
            state.current_message_id.clear();
            state.current_thinking_id.clear();
        });

        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        execution.with_entry(|entry| entry.prompt_done = Some(tx));

        let user_entry = TranscriptEntry::user_message(self.clock.epoch_ms(), text);
        self.transcript.append(&execution.session_id, &user_entry).await?;

        if let Err(err) = controller.prompt(text).await {
            // Pure transport failure: no stream event will ever arrive
            // for this turn, so this path alone applies completion.
            self.ingestor.complete_turn(execution, true, Some(err.to_string())).await?;
        }

        match rx.recv().await {
            Some(outcome) => Ok(outcome),
            None => {
                // Defensive: channel closed without a value. Apply
                // completion ourselves so a caller never hangs.
                self.ingestor
                    .complete_turn(execution, true, Some("prompt channel closed without completion".to_string()))
                    .await?;
                Ok(TurnOutcome {
                    stop_reason: alc_core::StopReason::Error,
                    agent_message: String::new(),
                    is_error: true,
                    error: Some("prompt channel closed without completion".to_string()),
                })
            }
        }
    }

    pub fn permission_response_deadline(&self) -> Duration {
        self.config.permission_response_deadline
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
