// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_display_matches_wire_format() {
    assert_eq!(TranscriptEntryKind::UserMessage.to_string(), "user-message");
    assert_eq!(TranscriptEntryKind::ToolCall.to_string(), "tool-call");
}

#[test]
fn round_trip_through_json_preserves_fields() {
    let entry = TranscriptEntry::tool_call(1234, "grep", "call-1", "rg foo");
    let json = serde_json::to_string(&entry).expect("serialize");
    let back: TranscriptEntry = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.timestamp_ms, 1234);
    assert_eq!(back.kind, TranscriptEntryKind::ToolCall);
    assert_eq!(back.tool_name.as_deref(), Some("grep"));
    assert_eq!(back.tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(back.content, "rg foo");
}

#[test]
fn user_message_has_no_tool_fields() {
    let entry = TranscriptEntry::user_message(1, "hello");
    assert!(entry.tool_name.is_none());
    assert!(entry.tool_call_id.is_none());
    assert_eq!(entry.role, "user");
}
