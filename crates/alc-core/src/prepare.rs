// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-preparation progress datatype, shared by every preparer and
//! executor backend so the Manager can publish uniform progress events
//! regardless of which backend is provisioning.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepareStepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

crate::simple_display! {
    PrepareStepStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareStep {
    pub name: String,
    pub status: PrepareStepStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
}

impl PrepareStep {
    pub fn start(name: impl Into<String>, started_at_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: PrepareStepStatus::Running,
            output: String::new(),
            error: None,
            started_at_ms,
            ended_at_ms: None,
        }
    }

    pub fn complete(mut self, output: impl Into<String>, ended_at_ms: u64) -> Self {
        self.status = PrepareStepStatus::Completed;
        self.output = output.into();
        self.ended_at_ms = Some(ended_at_ms);
        self
    }

    pub fn fail(mut self, error: impl Into<String>, ended_at_ms: u64) -> Self {
        self.status = PrepareStepStatus::Failed;
        self.error = Some(error.into());
        self.ended_at_ms = Some(ended_at_ms);
        self
    }

    pub fn skip(mut self, reason: impl Into<String>, ended_at_ms: u64) -> Self {
        self.status = PrepareStepStatus::Skipped;
        self.output = reason.into();
        self.ended_at_ms = Some(ended_at_ms);
        self
    }
}

/// Reports progress of a multi-step provisioning or preparation pipeline.
///
/// Backends call `on_progress(step_name, index, total)` with a stable
/// `total` for the lifetime of one call, so UI progress bars never jump
/// backwards.
pub type ProgressCallback<'a> = &'a (dyn Fn(&str, usize, usize) + Send + Sync);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareResult {
    pub steps: Vec<PrepareStep>,
    pub success: bool,
    pub duration: Duration,
}

impl PrepareResult {
    pub fn new(steps: Vec<PrepareStep>, duration: Duration) -> Self {
        // A failed setup-script step does not flip `success` to false —
        // only a fatal validation failure does, and callers signal that
        // by never reaching this constructor, returning an `Error` instead.
        Self { steps, success: true, duration }
    }

    pub fn failed(steps: Vec<PrepareStep>, duration: Duration) -> Self {
        Self { steps, success: false, duration }
    }
}

#[cfg(test)]
#[path = "prepare_tests.rs"]
mod tests;
