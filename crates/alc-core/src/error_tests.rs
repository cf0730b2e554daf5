// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn config_error_surfaces_message_verbatim() {
    let e = Error::Config("SPRITES_API_TOKEN not set".into());
    assert_eq!(e.to_string(), "configuration error: SPRITES_API_TOKEN not set");
}

#[test]
fn not_ready_includes_attempts_and_elapsed() {
    let e = Error::NotReady { attempts: 30, elapsed_ms: 15_000 };
    assert_eq!(e.to_string(), "not ready after 30 attempts (15000ms)");
}

#[test]
fn duplicate_session_includes_session_id() {
    let e = Error::DuplicateSession(SessionId::new("sess-1"));
    assert_eq!(e.to_string(), "session id already in use: sess-1");
}

#[test]
fn io_error_converts_via_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let e: Error = io_err.into();
    assert!(matches!(e, Error::Io(_)));
}
