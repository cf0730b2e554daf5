// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-container backend: declared so the registry and its fan-out
//! operations stay total, but provisioning is deferred — it always
//! returns a typed "not implemented" failure rather than a panic.

use crate::backend::{CreateInstanceRequest, ExecutorBackend};
use alc_core::{Error, ExecutorInstance, ProgressCallback, Result};

pub struct RemoteContainerExecutor;

impl RemoteContainerExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RemoteContainerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for RemoteContainerExecutor {
    fn name(&self) -> &str {
        "remote-docker"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_instance(
        &self,
        _request: &CreateInstanceRequest,
        _on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        Err(Error::UnsupportedCapability("remote-container provisioning is not implemented"))
    }

    async fn stop_instance(&self, _instance: &ExecutorInstance, _force: bool) -> Result<()> {
        Err(Error::UnsupportedCapability("remote-container provisioning is not implemented"))
    }

    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[path = "remote_container_tests.rs"]
mod tests;
