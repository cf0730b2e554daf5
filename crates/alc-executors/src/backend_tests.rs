// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use alc_core::RemoteStatus;

struct PlainBackend;

#[async_trait::async_trait]
impl ExecutorBackend for PlainBackend {
    fn name(&self) -> &str {
        "plain"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_instance(
        &self,
        _request: &CreateInstanceRequest,
        _on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        unimplemented!("not exercised in this test")
    }

    async fn stop_instance(&self, _instance: &ExecutorInstance, _force: bool) -> Result<()> {
        Ok(())
    }

    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        Ok(Vec::new())
    }
}

struct StatusBackend;

#[async_trait::async_trait]
impl ExecutorBackend for StatusBackend {
    fn name(&self) -> &str {
        "status-capable"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_instance(
        &self,
        _request: &CreateInstanceRequest,
        _on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        unimplemented!("not exercised in this test")
    }

    async fn stop_instance(&self, _instance: &ExecutorInstance, _force: bool) -> Result<()> {
        Ok(())
    }

    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        Ok(Vec::new())
    }

    fn as_remote_status_provider(&self) -> Option<&dyn RemoteStatusProvider> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl RemoteStatusProvider for StatusBackend {
    async fn remote_status(&self, session_id: &SessionId) -> Result<RemoteStatus> {
        Ok(RemoteStatus {
            backend_name: self.name().to_string(),
            remote_name: session_id.to_string(),
            state: "running".to_string(),
            created_at_ms: 0,
            last_checked_at_ms: 0,
            error_message: None,
            details: Default::default(),
        })
    }
}

#[test]
fn plain_backend_has_no_optional_capabilities() {
    let backend = PlainBackend;
    assert!(backend.as_remote_session_resumer().is_none());
    assert!(backend.as_remote_status_provider().is_none());
}

#[tokio::test]
async fn status_capable_backend_exposes_remote_status() {
    let backend = StatusBackend;
    let provider = backend.as_remote_status_provider().expect("capability present");
    let status = provider.remote_status(&SessionId::new("sess-1")).await.expect("status");
    assert_eq!(status.state, "running");
}
