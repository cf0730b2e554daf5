// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment preparer contract.
//!
//! Each preparer owns a short fixed pipeline: given an [`EnvPrepareRequest`],
//! it returns an ordered list of completed prepare steps plus an overall
//! success flag. Preparers never themselves provision the sandbox —
//! that's the executor backend's job — they validate prerequisites and,
//! for the local backend, run the setup script.

use alc_core::{MetadataBag, PrepareResult, ProgressCallback, SessionId, TaskId};
use std::collections::HashMap;

/// Which executor kind a prepare request targets. Drives script-default
/// fallback and whether provisioning steps are validated here or left
/// to the executor backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorKind {
    Standalone,
    Container,
    RemoteContainer,
    Cloud,
}

alc_core::simple_display! {
    ExecutorKind {
        Standalone => "standalone",
        Container => "docker",
        RemoteContainer => "remote-docker",
        Cloud => "sprites-cloud",
    }
}

#[derive(Debug, Clone)]
pub struct EnvPrepareRequest {
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub executor_kind: ExecutorKind,
    pub workspace_path: Option<String>,
    pub repository_path: Option<String>,
    pub worktree_enabled: bool,
    pub worktree_branch: Option<String>,
    pub setup_script: Option<String>,
    pub env: HashMap<String, String>,
    /// Carries the remaining substitution values (worktree id/path/base,
    /// repository clone URL and branch, git identity) that don't have
    /// their own field above.
    pub metadata: MetadataBag,
}

impl EnvPrepareRequest {
    pub fn new(task_id: TaskId, session_id: SessionId, executor_kind: ExecutorKind) -> Self {
        Self {
            task_id,
            session_id,
            executor_kind,
            workspace_path: None,
            repository_path: None,
            worktree_enabled: false,
            worktree_branch: None,
            setup_script: None,
            env: HashMap::new(),
            metadata: MetadataBag::new(),
        }
    }
}

#[async_trait::async_trait]
pub trait EnvironmentPreparer: Send + Sync {
    /// Run this preparer's fixed pipeline, reporting progress as
    /// `(step_name, completed, total)` through `on_progress`.
    async fn prepare(
        &self,
        request: &EnvPrepareRequest,
        on_progress: ProgressCallback<'_>,
    ) -> alc_core::Result<PrepareResult>;
}

#[cfg(test)]
#[path = "preparer_tests.rs"]
mod tests;
