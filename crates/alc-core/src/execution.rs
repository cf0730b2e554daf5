// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Execution` entity — one per live agent session — and its state
//! machine.
//!
//! Three independent locks guard disjoint parts of an `Execution`, matching
//! the concurrency model: `entry` (multi-field status/metadata updates,
//! equivalent to the store's `WithLock`), `streaming` (message/reasoning/
//! thinking buffers, never held together with `activity`), and `activity`
//! (the stall-detection timestamp). A caller needing two of these must
//! acquire them one at a time — no code path in this crate holds more than
//! one at once.

use crate::ids::{AgentSessionId, ExecutionId, ExecutorProfileId, SessionId, TaskId};
use crate::metadata::MetadataBag;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Starting,
    Ready,
    Running,
    Completed,
    Failed,
    Stopped,
}

crate::simple_display! {
    ExecutionStatus {
        Starting => "starting",
        Ready => "ready",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Stopped => "stopped",
    }
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    /// Whether `self -> next` is a legal transition per the state machine.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExecutionStatus::*;
        match (self, next) {
            (Starting, Ready) => true,
            (Ready, Running) => true,
            (Running, Ready) => true,
            // Duplicate MarkReady is a documented no-op, not a transition.
            (Ready, Ready) => true,
            (_, Completed) | (_, Failed) | (_, Stopped) if !self.is_terminal() => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    Error,
    Cancelled,
}

/// Outcome of one prompt turn, delivered through the `promptDone` channel.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub stop_reason: StopReason,
    pub agent_message: String,
    pub is_error: bool,
    pub error: Option<String>,
}

/// Streaming buffers and segment identity, guarded by `Execution::streaming`.
#[derive(Debug, Default)]
pub struct StreamingState {
    pub message_buffer: String,
    pub reasoning_buffer: String,
    pub thinking_buffer: String,
    pub current_message_id: String,
    pub current_thinking_id: String,
}

impl StreamingState {
    pub fn is_clean(&self) -> bool {
        self.message_buffer.is_empty()
            && self.thinking_buffer.is_empty()
            && self.current_message_id.is_empty()
            && self.current_thinking_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.message_buffer.clear();
        self.reasoning_buffer.clear();
        self.thinking_buffer.clear();
        self.current_message_id.clear();
        self.current_thinking_id.clear();
    }
}

/// Fields updated together under the entry lock (`WithLock` in the store).
pub struct ExecutionEntry {
    pub agent_session_id: Option<AgentSessionId>,
    pub status: ExecutionStatus,
    pub backend_name: String,
    pub container_id: Option<String>,
    pub container_ip: Option<String>,
    pub standalone_instance_id: Option<String>,
    pub standalone_port: Option<u16>,
    pub workspace_path: Option<String>,
    pub runtime_metadata: HashMap<String, String>,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
    pub available_commands: Vec<String>,
    pub prompt_done: Option<mpsc::Sender<TurnOutcome>>,
}

pub struct Execution {
    pub execution_id: ExecutionId,
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub executor_profile_id: ExecutorProfileId,
    pub metadata: MetadataBag,
    entry: Mutex<ExecutionEntry>,
    streaming: Mutex<StreamingState>,
    activity: Mutex<u64>,
}

impl Execution {
    pub fn new(
        execution_id: ExecutionId,
        task_id: TaskId,
        session_id: SessionId,
        executor_profile_id: ExecutorProfileId,
        backend_name: impl Into<String>,
        metadata: MetadataBag,
        started_at_ms: u64,
    ) -> Self {
        Self {
            execution_id,
            task_id,
            session_id,
            executor_profile_id,
            metadata,
            entry: Mutex::new(ExecutionEntry {
                agent_session_id: None,
                status: ExecutionStatus::Starting,
                backend_name: backend_name.into(),
                container_id: None,
                container_ip: None,
                standalone_instance_id: None,
                standalone_port: None,
                workspace_path: None,
                runtime_metadata: HashMap::new(),
                started_at_ms,
                finished_at_ms: None,
                exit_code: None,
                error_message: None,
                available_commands: Vec::new(),
                prompt_done: None,
            }),
            streaming: Mutex::new(StreamingState::default()),
            activity: Mutex::new(started_at_ms),
        }
    }

    /// Exclusive access to entry-locked fields for an atomic multi-field
    /// update. Mirrors the store's `WithLock(id, fn)`.
    pub fn with_entry<R>(&self, f: impl FnOnce(&mut ExecutionEntry) -> R) -> R {
        f(&mut self.entry.lock())
    }

    pub fn status(&self) -> ExecutionStatus {
        self.entry.lock().status
    }

    /// Attempt a status transition. Returns `Ok(true)` if the status
    /// changed, `Ok(false)` for a documented no-op (duplicate `MarkReady`),
    /// `Err` for an illegal transition.
    pub fn transition(&self, next: ExecutionStatus) -> crate::error::Result<bool> {
        let mut entry = self.entry.lock();
        if entry.status == next {
            return Ok(false);
        }
        if !entry.status.can_transition_to(next) {
            return Err(crate::error::Error::InvalidTransition {
                from: entry.status.to_string(),
                to: next.to_string(),
            });
        }
        entry.status = next;
        Ok(true)
    }

    pub fn with_streaming<R>(&self, f: impl FnOnce(&mut StreamingState) -> R) -> R {
        f(&mut self.streaming.lock())
    }

    pub fn touch_activity(&self, now_ms: u64) {
        *self.activity.lock() = now_ms;
    }

    pub fn last_activity_at_ms(&self) -> u64 {
        *self.activity.lock()
    }

    /// Invariant: ready ⇒ streaming buffers and message ids are empty.
    pub fn ready_invariant_holds(&self) -> bool {
        let status = self.status();
        status != ExecutionStatus::Ready || self.streaming.lock().is_clean()
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
