// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for the lifecycle core.
//!
//! `ExecutionId` and `TaskId` are generated locally (4-char prefix + random
//! suffix, via [`crate::define_id!`]). `SessionId` and `AgentSessionId` are
//! opaque handles assigned elsewhere — the caller for sessions, the
//! in-sandbox controller for agent sessions — so they wrap a plain string
//! rather than carrying a generation scheme of their own.

use std::fmt;

crate::define_id! {
    /// Unique identifier for one live agent execution, assigned at creation.
    pub struct ExecutionId("exe-");
}

crate::define_id! {
    /// Identifier for the task this execution serves.
    pub struct TaskId("tsk-");
}

/// Caller-supplied conversational handle. Maps one-to-one (while live) to
/// an `ExecutionId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form of this id, for use as a transcript file stem.
    ///
    /// Replaces path separators with `_` per the transcript storage contract.
    pub fn sanitized(&self) -> String {
        self.0.replace(['/', '\\'], "_")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier assigned by the in-sandbox controller on `session/new`,
/// echoed back on `session/load`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AgentSessionId(String);

impl AgentSessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentSessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentSessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque key into the externally-owned agent-type / executor-profile
/// configuration catalog. The catalog itself is a collaborator, not part
/// of this core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ExecutorProfileId(String);

impl ExecutorProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutorProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutorProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
