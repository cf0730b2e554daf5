// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript entry data model.
//!
//! One entry per user message, agent message, tool call, or tool result.
//! Entries are self-delimiting records — one per line in a per-session
//! jsonl file — so the store can append and the forker can stream-read
//! without holding the whole transcript in memory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptEntryKind {
    UserMessage,
    AgentMessage,
    ToolCall,
    ToolResult,
}

crate::simple_display! {
    TranscriptEntryKind {
        UserMessage => "user-message",
        AgentMessage => "agent-message",
        ToolCall => "tool-call",
        ToolResult => "tool-result",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp_ms: u64,
    pub kind: TranscriptEntryKind,
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl TranscriptEntry {
    pub fn user_message(timestamp_ms: u64, content: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: TranscriptEntryKind::UserMessage,
            role: "user".to_string(),
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_status: None,
            operation_id: None,
        }
    }

    pub fn agent_message(timestamp_ms: u64, content: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: TranscriptEntryKind::AgentMessage,
            role: "assistant".to_string(),
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_status: None,
            operation_id: None,
        }
    }

    pub fn tool_call(
        timestamp_ms: u64,
        tool_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            timestamp_ms,
            kind: TranscriptEntryKind::ToolCall,
            role: "assistant".to_string(),
            content: content.into(),
            tool_name: Some(tool_name.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_status: None,
            operation_id: None,
        }
    }

    pub fn tool_result(
        timestamp_ms: u64,
        tool_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        tool_status: impl Into<String>,
    ) -> Self {
        Self {
            timestamp_ms,
            kind: TranscriptEntryKind::ToolResult,
            role: "tool".to_string(),
            content: content.into(),
            tool_name: Some(tool_name.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_status: Some(tool_status.into()),
            operation_id: None,
        }
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
