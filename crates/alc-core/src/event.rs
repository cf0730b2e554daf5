// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed event payloads published by the Event Publisher.
//!
//! Each kind is a tagged variant, never a nullable-field struct — publish
//! code does kind-dispatch, subscribers match on the tag. Subject
//! construction is a pure function of kind + session-id, exposed as
//! [`Event::subject`] so callers never hand-build subject strings.

use crate::ids::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AgentStarted { session_id: SessionId },
    AgentStopped { session_id: SessionId },
    AgentReady { session_id: SessionId },
    AgentCompleted { session_id: SessionId, exit_code: Option<i32> },
    AgentFailed { session_id: SessionId, error: String },

    ControllerStarted { session_id: SessionId },
    ControllerStopped { session_id: SessionId },

    AgentSessionCreated {
        session_id: SessionId,
        agent_session_id: String,
        agent_name: String,
        agent_version: String,
    },

    /// One flush of the message/reasoning/thinking buffer.
    MessageStreaming {
        session_id: SessionId,
        message_id: String,
        text: String,
        is_append: bool,
        is_reasoning: bool,
    },

    ToolCall { session_id: SessionId, tool_call_id: String, name: String, input: serde_json::Value },
    ToolUpdate { session_id: SessionId, tool_call_id: String, status: String, output: Option<String> },

    PermissionRequest {
        session_id: SessionId,
        pending_id: String,
        options: Vec<String>,
        action_type: String,
    },

    ContextWindow { session_id: SessionId, used_tokens: u64, max_tokens: u64 },
    AvailableCommands { session_id: SessionId, commands: Vec<String> },
    Plan { session_id: SessionId, plan: serde_json::Value },
    AgentStreamError { session_id: SessionId, message: String },

    GitStatus { session_id: SessionId, status: serde_json::Value },
    GitCommit { session_id: SessionId, sha: String, message: String },
    GitReset { session_id: SessionId, sha: String },
    FileChange { session_id: SessionId, path: String, change_kind: String },
    ShellOutput { session_id: SessionId, shell_id: String, chunk: String },
    ShellExit { session_id: SessionId, shell_id: String, exit_code: Option<i32> },
    ProcessOutput { session_id: SessionId, process_id: String, chunk: String },
    ProcessStatus { session_id: SessionId, process_id: String, status: String },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AgentStarted { .. } => "agent.started",
            Event::AgentStopped { .. } => "agent.stopped",
            Event::AgentReady { .. } => "agent.ready",
            Event::AgentCompleted { .. } => "agent.completed",
            Event::AgentFailed { .. } => "agent.failed",
            Event::ControllerStarted { .. } => "controller.started",
            Event::ControllerStopped { .. } => "controller.stopped",
            Event::AgentSessionCreated { .. } => "agent.session_created",
            Event::MessageStreaming { .. } => "agent.message_streaming",
            Event::ToolCall { .. } => "agent.tool_call",
            Event::ToolUpdate { .. } => "agent.tool_update",
            Event::PermissionRequest { .. } => "agent.permission_request",
            Event::ContextWindow { .. } => "agent.context_window",
            Event::AvailableCommands { .. } => "agent.available_commands",
            Event::Plan { .. } => "agent.plan",
            Event::AgentStreamError { .. } => "agent.error",
            Event::GitStatus { .. } => "workspace.git_status",
            Event::GitCommit { .. } => "workspace.git_commit",
            Event::GitReset { .. } => "workspace.git_reset",
            Event::FileChange { .. } => "workspace.file_change",
            Event::ShellOutput { .. } => "workspace.shell_output",
            Event::ShellExit { .. } => "workspace.shell_exit",
            Event::ProcessOutput { .. } => "workspace.process_output",
            Event::ProcessStatus { .. } => "workspace.process_status",
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            Event::AgentStarted { session_id }
            | Event::AgentStopped { session_id }
            | Event::AgentReady { session_id }
            | Event::AgentCompleted { session_id, .. }
            | Event::AgentFailed { session_id, .. }
            | Event::ControllerStarted { session_id }
            | Event::ControllerStopped { session_id }
            | Event::AgentSessionCreated { session_id, .. }
            | Event::MessageStreaming { session_id, .. }
            | Event::ToolCall { session_id, .. }
            | Event::ToolUpdate { session_id, .. }
            | Event::PermissionRequest { session_id, .. }
            | Event::ContextWindow { session_id, .. }
            | Event::AvailableCommands { session_id, .. }
            | Event::Plan { session_id, .. }
            | Event::AgentStreamError { session_id, .. }
            | Event::GitStatus { session_id, .. }
            | Event::GitCommit { session_id, .. }
            | Event::GitReset { session_id, .. }
            | Event::FileChange { session_id, .. }
            | Event::ShellOutput { session_id, .. }
            | Event::ShellExit { session_id, .. }
            | Event::ProcessOutput { session_id, .. }
            | Event::ProcessStatus { session_id, .. } => session_id,
        }
    }

    /// Subject string subscribers filter on: `exec.<session-id>.<kind>`.
    ///
    /// Pure function of kind + session-id, no dependency on publisher state.
    pub fn subject(&self) -> String {
        format!("exec.{}.{}", self.session_id(), self.kind())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
