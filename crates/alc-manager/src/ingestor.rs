// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Folds controller stream events into execution state and publishes
//! their downstream effects.
//!
//! Completion is handled in exactly one place: whichever path notices a
//! turn ended — a `complete` event off the agent-event stream, or a
//! transport failure in `SendPrompt` — calls
//! [`StreamIngestor::complete_turn`], which flushes buffers, appends the
//! transcript, transitions the execution, publishes the lifecycle event,
//! and signals `promptDone`. Nothing else is allowed to duplicate that
//! sequence.

use crate::controller::{AgentEvent, WorkspaceEvent};
use crate::publisher::EventPublisher;
use crate::store::ExecutionStore;
use alc_core::{
    Clock, Event, Execution, ExecutionId, ExecutionStatus, Result, StopReason, TranscriptEntry, TurnOutcome,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-segment "has this buffer published a chunk yet" bit. `StreamingState`
/// tracks the buffer and current id but not this — segment end resets both
/// here and there together.
#[derive(Debug, Default, Clone, Copy)]
struct SegmentFlags {
    message_published: bool,
    thinking_published: bool,
}

pub struct StreamIngestor<C: Clock> {
    publisher: Arc<EventPublisher>,
    transcript: Arc<alc_transcript::TranscriptStore>,
    store: Arc<ExecutionStore>,
    clock: C,
    segment_flags: Mutex<HashMap<ExecutionId, SegmentFlags>>,
}

impl<C: Clock> StreamIngestor<C> {
    pub fn new(
        publisher: Arc<EventPublisher>,
        transcript: Arc<alc_transcript::TranscriptStore>,
        store: Arc<ExecutionStore>,
        clock: C,
    ) -> Self {
        Self { publisher, transcript, store, clock, segment_flags: Mutex::new(HashMap::new()) }
    }

    pub async fn handle_agent_event(&self, execution: &Arc<Execution>, event: AgentEvent) {
        execution.touch_activity(self.clock.epoch_ms());
        match event {
            AgentEvent::MessageChunk { text, is_reasoning } => {
                self.ingest_chunk(execution, &text, is_reasoning);
            }
            AgentEvent::ToolCall { tool_call_id, name, input } => {
                self.handle_tool_call(execution, tool_call_id, name, input).await;
            }
            AgentEvent::ToolUpdate { tool_call_id, status, output } => {
                self.publisher.publish(Event::ToolUpdate {
                    session_id: execution.session_id.clone(),
                    tool_call_id,
                    status,
                    output,
                });
            }
            AgentEvent::PermissionRequest { pending_id, options, action_type } => {
                self.publisher.publish(Event::PermissionRequest {
                    session_id: execution.session_id.clone(),
                    pending_id,
                    options,
                    action_type,
                });
            }
            AgentEvent::ContextWindow { used_tokens, max_tokens } => {
                self.publisher.publish(Event::ContextWindow {
                    session_id: execution.session_id.clone(),
                    used_tokens,
                    max_tokens,
                });
            }
            AgentEvent::AvailableCommands { commands } => {
                execution.with_entry(|entry| entry.available_commands = commands.clone());
                self.publisher
                    .publish(Event::AvailableCommands { session_id: execution.session_id.clone(), commands });
            }
            AgentEvent::Plan { plan } => {
                self.publisher.publish(Event::Plan { session_id: execution.session_id.clone(), plan });
            }
            AgentEvent::StreamError { message } => {
                self.publisher
                    .publish(Event::AgentStreamError { session_id: execution.session_id.clone(), message });
            }
            AgentEvent::Complete { is_error, error } => {
                self.complete(execution, is_error, error).await;
            }
        }
    }

    pub fn handle_workspace_event(&self, execution: &Arc<Execution>, event: WorkspaceEvent) {
        execution.touch_activity(self.clock.epoch_ms());
        let session_id = execution.session_id.clone();
        let published = match event {
            WorkspaceEvent::GitStatus { status } => Event::GitStatus { session_id, status },
            WorkspaceEvent::GitCommit { sha, message } => Event::GitCommit { session_id, sha, message },
            WorkspaceEvent::GitReset { sha } => Event::GitReset { session_id, sha },
            WorkspaceEvent::FileChange { path, change_kind } => Event::FileChange { session_id, path, change_kind },
            WorkspaceEvent::ShellOutput { shell_id, chunk } => Event::ShellOutput { session_id, shell_id, chunk },
            WorkspaceEvent::ShellExit { shell_id, exit_code } => {
                Event::ShellExit { session_id, shell_id, exit_code }
            }
            WorkspaceEvent::ProcessOutput { process_id, chunk } => {
                Event::ProcessOutput { session_id, process_id, chunk }
            }
            WorkspaceEvent::ProcessStatus { process_id, status } => {
                Event::ProcessStatus { session_id, process_id, status }
            }
        };
        self.publisher.publish(published);
    }

    /// Accumulate `text` into the right buffer and flush up to the last
    /// newline, publishing at most one `message_streaming` event per chunk.
    fn ingest_chunk(&self, execution: &Arc<Execution>, text: &str, is_reasoning: bool) {
        let flushed = execution.with_streaming(|state| {
            let is_new_segment = if is_reasoning {
                state.current_thinking_id.is_empty()
            } else {
                state.current_message_id.is_empty()
            };
            if is_new_segment {
                let id = format!("msg-{}", nanoid::nanoid!(12));
                if is_reasoning {
                    state.current_thinking_id = id;
                } else {
                    state.current_message_id = id;
                }
            }
            let id = if is_reasoning { state.current_thinking_id.clone() } else { state.current_message_id.clone() };
            let buffer = if is_reasoning { &mut state.thinking_buffer } else { &mut state.message_buffer };
            buffer.push_str(text);
            let flush_to = buffer.rfind('\n').map(|idx| idx + 1);
            flush_to.map(|end| (id, buffer.drain(..end).collect::<String>()))
        });
        let Some((id, flushed)) = flushed else { return };
        self.publish_flush(execution, id, flushed, is_reasoning);
    }

    /// Final, forced flush at a segment boundary (`tool_call` or
    /// `complete`) — publishes whatever remains even without a trailing
    /// newline, then resets segment identity for the next turn.
    ///
    /// Captures each buffer's id before clearing it, since the
    /// `message_streaming` payload for this last chunk still carries the
    /// segment's id even though the segment is ending.
    fn flush_segment_end(&self, execution: &Arc<Execution>) -> Option<String> {
        let (message_id, message_flushed, thinking_id, thinking_flushed) = execution.with_streaming(|state| {
            let message_id = std::mem::take(&mut state.current_message_id);
            let thinking_id = std::mem::take(&mut state.current_thinking_id);
            let message = std::mem::take(&mut state.message_buffer);
            let thinking = std::mem::take(&mut state.thinking_buffer);
            (message_id, message, thinking_id, thinking)
        });
        if !thinking_flushed.is_empty() {
            self.publish_flush(execution, thinking_id, thinking_flushed, true);
        }
        let result = if !message_flushed.is_empty() {
            self.publish_flush(execution, message_id, message_flushed.clone(), false);
            Some(message_flushed)
        } else {
            None
        };
        // Reset after publishing so this last flush still sees whether an
        // earlier chunk in the segment already published (isAppend=true).
        self.segment_flags.lock().remove(&execution.execution_id);
        result
    }

    fn publish_flush(&self, execution: &Arc<Execution>, message_id: String, text: String, is_reasoning: bool) {
        let is_append = {
            let mut flags = self.segment_flags.lock();
            let entry = flags.entry(execution.execution_id.clone()).or_default();
            let published = if is_reasoning { &mut entry.thinking_published } else { &mut entry.message_published };
            let was_published = *published;
            *published = true;
            was_published
        };
        self.publisher.publish(Event::MessageStreaming {
            session_id: execution.session_id.clone(),
            message_id,
            text,
            is_append,
            is_reasoning,
        });
    }

    async fn handle_tool_call(&self, execution: &Arc<Execution>, tool_call_id: String, name: String, input: serde_json::Value) {
        if let Some(flushed) = self.flush_segment_end(execution) {
            let entry = TranscriptEntry::agent_message(self.clock.epoch_ms(), flushed);
            if let Err(e) = self.transcript.append(&execution.session_id, &entry).await {
                tracing::warn!("failed to append agent message to transcript: {}", e);
            }
        }
        let entry = TranscriptEntry::tool_call(self.clock.epoch_ms(), name.clone(), tool_call_id.clone(), input.to_string());
        if let Err(e) = self.transcript.append(&execution.session_id, &entry).await {
            tracing::warn!("failed to append tool call to transcript: {}", e);
        }
        self.publisher.publish(Event::ToolCall { session_id: execution.session_id.clone(), tool_call_id, name, input });
    }

    async fn complete(&self, execution: &Arc<Execution>, is_error: bool, error: Option<String>) {
        if let Err(e) = self.complete_turn(execution, is_error, error).await {
            tracing::warn!("failed to apply turn completion: {}", e);
        }
    }

    /// Sole place a turn's end is applied: flush, transcript, transition,
    /// publish, then signal `promptDone`. Called from the agent-event
    /// `complete` handler and, as a fallback, directly by `SendPrompt` when
    /// the controller call itself fails before any stream event can arrive
    /// (in which case the buffers are typically already empty).
    ///
    /// Reuses `flush_segment_end` rather than re-deriving the flush so a
    /// turn whose buffer never hit a newline still gets the correct
    /// `is_append`/message-id on its one and only flush.
    pub async fn complete_turn(&self, execution: &Arc<Execution>, is_error: bool, error: Option<String>) -> Result<()> {
        let flushed = self.flush_segment_end(execution);
        if let Some(flushed) = &flushed {
            let entry = TranscriptEntry::agent_message(self.clock.epoch_ms(), flushed.clone());
            self.transcript.append(&execution.session_id, &entry).await?;
        }
        let agent_message = flushed.unwrap_or_default();

        let outcome = if is_error {
            let message = error.clone().unwrap_or_else(|| "agent error completion".to_string());
            mark_completed(execution, &self.store, &self.publisher, &self.clock, Some(1), message.clone())?;
            TurnOutcome { stop_reason: StopReason::Error, agent_message, is_error: true, error: Some(message) }
        } else {
            mark_ready(execution, &self.publisher)?;
            TurnOutcome { stop_reason: StopReason::EndTurn, agent_message, is_error: false, error: None }
        };

        let sender = execution.with_entry(|entry| entry.prompt_done.take());
        if let Some(sender) = sender {
            // Capacity-1, non-blocking: a full channel means nobody is
            // waiting on this turn anymore (the initial prompt ran detached).
            let _ = sender.try_send(outcome);
        }
        Ok(())
    }
}

/// `Running -> Ready`. A no-op if already `Ready` (duplicate `MarkReady`
/// must never publish a second `agent.ready`).
pub fn mark_ready(execution: &Arc<Execution>, publisher: &EventPublisher) -> Result<()> {
    if execution.transition(ExecutionStatus::Ready)? {
        publisher.publish(Event::AgentReady { session_id: execution.session_id.clone() });
    }
    Ok(())
}

/// Any non-terminal state -> `Completed`/`Failed`, then removes the
/// execution from the store — terminal states are always followed by
/// removal.
pub fn mark_completed<C: Clock>(
    execution: &Arc<Execution>,
    store: &ExecutionStore,
    publisher: &EventPublisher,
    clock: &C,
    exit_code: Option<i32>,
    message: impl Into<String>,
) -> Result<()> {
    let message = message.into();
    let failed = exit_code.map(|code| code != 0).unwrap_or(false) || !message.is_empty();
    let now = clock.epoch_ms();
    execution.with_entry(|entry| {
        entry.finished_at_ms = Some(now);
        entry.exit_code = exit_code;
        if !message.is_empty() {
            entry.error_message = Some(message.clone());
        }
    });
    if failed {
        execution.transition(ExecutionStatus::Failed)?;
        publisher.publish(Event::AgentFailed { session_id: execution.session_id.clone(), error: message });
    } else {
        execution.transition(ExecutionStatus::Completed)?;
        publisher.publish(Event::AgentCompleted { session_id: execution.session_id.clone(), exit_code });
    }
    store.remove(&execution.execution_id);
    Ok(())
}

#[cfg(test)]
#[path = "ingestor_tests.rs"]
mod tests;
