// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume-context generation: turning a stored transcript plus a new
//! instruction into the prompt a freshly-started agent session sees.
//!
//! Formats each entry by kind, truncates long content so the resume
//! prompt stays bounded, then appends the new instruction. Builds the
//! history into a single capped buffer rather than an unbounded string
//! so a pathological transcript can't blow up memory before truncation
//! even has a chance to apply.

use crate::store::TranscriptStore;
use alc_core::{Result, SessionId, TranscriptEntryKind};

const MAX_HISTORY_BYTES: usize = 1024 * 1024;
const MAX_MESSAGE_CHARS: usize = 2000;
const MAX_TOOL_RESULT_CHARS: usize = 500;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push_str("... [truncated]");
    truncated
}

/// Build the resume prompt for continuing `session_id` with
/// `new_prompt`, reading transcript history from `store`.
///
/// If no transcript exists yet for the session, the new prompt is
/// returned unchanged — there's nothing to resume from.
pub async fn generate_resume_context(
    store: &TranscriptStore,
    session_id: &SessionId,
    new_prompt: &str,
) -> Result<String> {
    let entries = store.read_history(session_id).await?;
    if entries.is_empty() {
        return Ok(new_prompt.to_string());
    }

    let mut history = String::new();
    for entry in &entries {
        let line = match entry.kind {
            TranscriptEntryKind::UserMessage => {
                format!("[USER]: {}\n", truncate(&entry.content, MAX_MESSAGE_CHARS))
            }
            TranscriptEntryKind::AgentMessage => {
                format!("[ASSISTANT]: {}\n", truncate(&entry.content, MAX_MESSAGE_CHARS))
            }
            TranscriptEntryKind::ToolCall => {
                let name = entry.tool_name.as_deref().unwrap_or("unknown");
                format!("[TOOL CALL: {name}]\n")
            }
            TranscriptEntryKind::ToolResult => {
                let name = entry.tool_name.as_deref().unwrap_or("unknown");
                format!(
                    "[TOOL RESULT: {name}] {}\n",
                    truncate(&entry.content, MAX_TOOL_RESULT_CHARS)
                )
            }
        };
        if history.len() + line.len() > MAX_HISTORY_BYTES {
            break;
        }
        history.push_str(&line);
    }

    Ok(format!(
        "RESUME CONTEXT FOR CONTINUING TASK\n\n{history}\nNEW INSTRUCTION:\n{new_prompt}"
    ))
}

#[cfg(test)]
#[path = "forker_tests.rs"]
mod tests;
