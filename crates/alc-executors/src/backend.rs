// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The polymorphic Executor Backend boundary: every backend — standalone,
//! container, remote-container, cloud — implements the same lifecycle
//! contract so the Manager and Registry never special-case by kind.

use alc_core::{ExecutionId, ExecutorInstance, ExecutorProfileId, MetadataBag, ProgressCallback, Result, SessionId, TaskId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CreateInstanceRequest {
    pub execution_id: ExecutionId,
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub executor_profile_id: ExecutorProfileId,
    pub workspace_path: String,
    pub credentials: HashMap<String, String>,
    pub metadata: MetadataBag,
}

#[async_trait::async_trait]
pub trait ExecutorBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn health_check(&self) -> Result<()>;

    /// Provision a new in-sandbox instance and return a client handle.
    ///
    /// Implementations report multi-step progress through `on_progress`
    /// with a total that stays stable across the whole call, and on any
    /// failure after partial provisioning best-effort roll back before
    /// returning the error.
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance>;

    async fn stop_instance(&self, instance: &ExecutorInstance, force: bool) -> Result<()>;

    /// Reconstruct instances for sessions already running when this
    /// backend process restarted, by enumerating backend-native state
    /// (containers, processes) rather than any local bookkeeping.
    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>>;

    /// Capability accessor: backends that can reattach to a live remote
    /// instance on resume override this; the default says no.
    fn as_remote_session_resumer(&self) -> Option<&dyn RemoteSessionResumer> {
        None
    }

    /// Capability accessor: backends that expose liveness/state for a
    /// running instance override this; the default says no.
    fn as_remote_status_provider(&self) -> Option<&dyn RemoteStatusProvider> {
        None
    }
}

#[async_trait::async_trait]
pub trait RemoteSessionResumer: Send + Sync {
    async fn resume_remote_instance(&self, session_id: &SessionId) -> Result<ExecutorInstance>;
}

#[async_trait::async_trait]
pub trait RemoteStatusProvider: Send + Sync {
    async fn remote_status(&self, session_id: &SessionId) -> Result<alc_core::RemoteStatus>;
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
