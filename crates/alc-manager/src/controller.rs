// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-sandbox controller's client API, as consumed by this core.
//!
//! The wire protocol itself (HTTP/websocket framing, request/response
//! shapes) is an explicit collaborator boundary — this trait models only
//! the conceptual operations the Session Manager and Stream Ingestor
//! need, so a concrete transport can be dropped in without touching
//! either. `stream_agent_events`/`stream_workspace` return once the
//! subscription is established; the callback is invoked for the
//! lifetime of the underlying connection from an implementation-owned
//! task.

use alc_core::{AgentSessionId, InstanceClient, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct McpServerDescriptor {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct CreatedInstance {
    pub id: String,
    pub port: u16,
}

/// Raw signal arriving on the controller's agent-event stream, before the
/// Stream Ingestor turns it into a typed [`alc_core::Event`] and folds it
/// into execution state.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    MessageChunk { text: String, is_reasoning: bool },
    ToolCall { tool_call_id: String, name: String, input: serde_json::Value },
    ToolUpdate { tool_call_id: String, status: String, output: Option<String> },
    PermissionRequest { pending_id: String, options: Vec<String>, action_type: String },
    ContextWindow { used_tokens: u64, max_tokens: u64 },
    AvailableCommands { commands: Vec<String> },
    Plan { plan: serde_json::Value },
    StreamError { message: String },
    /// Turn completion. `is_error` distinguishes an agent-reported
    /// failure (e.g. "out of quota") from a normal end of turn.
    Complete { is_error: bool, error: Option<String> },
}

/// Raw signal arriving on the controller's workspace stream.
#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    GitStatus { status: serde_json::Value },
    GitCommit { sha: String, message: String },
    GitReset { sha: String },
    FileChange { path: String, change_kind: String },
    ShellOutput { shell_id: String, chunk: String },
    ShellExit { shell_id: String, exit_code: Option<i32> },
    ProcessOutput { process_id: String, chunk: String },
    ProcessStatus { process_id: String, status: String },
}

pub type AgentEventHandler = Box<dyn Fn(AgentEvent) + Send + Sync>;
pub type WorkspaceEventHandler = Box<dyn Fn(WorkspaceEvent) + Send + Sync>;

/// One per-instance controller connection. A concrete implementation
/// owns the transport (HTTP client, websocket) bound to one
/// [`InstanceClient`]; this core never constructs one directly, only
/// through a [`ControllerClientFactory`].
#[async_trait::async_trait]
pub trait ControllerClient: Send + Sync {
    async fn health(&self) -> Result<()>;

    async fn initialize(&self, client_name: &str, client_version: &str) -> Result<AgentIdentity>;

    async fn session_new(&self, workspace_path: &str, mcp_servers: &[McpServerDescriptor]) -> Result<AgentSessionId>;

    async fn session_load(&self, agent_session_id: &AgentSessionId) -> Result<()>;

    /// Blocks until the agent's turn fully completes. Mid-turn partial
    /// output and the final `complete` signal arrive separately, on the
    /// agent-event stream this instance is already subscribed to.
    async fn prompt(&self, text: &str) -> Result<()>;

    async fn cancel(&self) -> Result<()>;

    async fn respond_to_permission(&self, pending_id: &str, option_id: &str, cancelled: bool) -> Result<()>;

    async fn stream_agent_events(&self, on_event: AgentEventHandler) -> Result<()>;

    async fn stream_workspace(&self, on_event: WorkspaceEventHandler) -> Result<()>;
}

/// Connects to the controller bound to a freshly provisioned instance.
///
/// The concrete transport (what `endpoint`/`auth_token` mean on the
/// wire) is a collaborator this core never defines.
pub trait ControllerClientFactory: Send + Sync {
    fn connect(&self, client: &InstanceClient) -> Arc<dyn ControllerClient>;
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
