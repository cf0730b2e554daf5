// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the lifecycle core.
//!
//! Kinds mirror the failure-semantics table: configuration errors are
//! fatal and surfaced verbatim, transient errors carry retry accounting,
//! provisioning errors imply a rollback already happened by the time the
//! caller sees them, and `Cancelled` is deliberately distinct from every
//! other variant so callers never mistake a cancellation for a failure.

use crate::ids::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not ready after {attempts} attempts ({elapsed_ms}ms)")]
    NotReady { attempts: u32, elapsed_ms: u64 },

    #[error("provisioning failed: {0}")]
    Provisioning(String),

    #[error("controller error: {0}")]
    Controller(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("no session bound for {0}")]
    SessionNotFound(SessionId),

    #[error("session id already in use: {0}")]
    DuplicateSession(SessionId),

    #[error("execution has no agent session id; session manager never completed initialization")]
    NotInitialized,

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("unknown executor backend: {0}")]
    UnknownBackend(String),

    #[error("backend does not implement this capability: {0}")]
    UnsupportedCapability(&'static str),

    #[error("timed out waiting for permission response")]
    PermissionTimeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
