// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-process backend: one long-running local controller multiplexes
//! N in-process agent instances, each reachable on its own TCP port.

use crate::backend::{CreateInstanceRequest, ExecutorBackend};
use crate::http;
use alc_core::{ControllerEndpoint, Error, ExecutorInstance, InstanceClient, ProgressCallback, Result};
use std::collections::HashMap;
use std::time::Duration;

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(200);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct StandaloneExecutor {
    controller_addr: String,
}

impl StandaloneExecutor {
    pub fn new(controller_addr: impl Into<String>) -> Self {
        Self { controller_addr: controller_addr.into() }
    }

    async fn wait_for_health(&self) -> Result<()> {
        let deadline = tokio::time::Instant::now() + HEALTH_TIMEOUT;
        loop {
            if http::get(&self.controller_addr, "/health").await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Controller(format!(
                    "controller at {} did not become healthy within {:?}",
                    self.controller_addr, HEALTH_TIMEOUT
                )));
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for StandaloneExecutor {
    fn name(&self) -> &str {
        "standalone"
    }

    async fn health_check(&self) -> Result<()> {
        http::get(&self.controller_addr, "/health").await.map(|_| ())
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        on_progress("wait for controller health", 0, 2);
        self.wait_for_health().await?;
        on_progress("wait for controller health", 1, 2);

        on_progress("create instance", 1, 2);
        let body = serde_json::json!({
            "execution_id": request.execution_id.to_string(),
            "session_id": request.session_id.as_str(),
            "workspace_path": request.workspace_path,
        });
        let response = http::post_authed(&self.controller_addr, "/api/v1/instances", &body.to_string(), "")
            .await?;
        let parsed: serde_json::Value = serde_json::from_str(&response)?;
        let port = parsed
            .get("port")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::Controller("create-instance response missing port".to_string()))?
            as u16;
        on_progress("create instance", 2, 2);

        Ok(ExecutorInstance {
            execution_id: request.execution_id.clone(),
            task_id: request.task_id.clone(),
            session_id: request.session_id.clone(),
            backend_name: self.name().to_string(),
            client: InstanceClient { endpoint: ControllerEndpoint::LocalPort(port), auth_token: None },
            backend_ids: HashMap::new(),
            workspace_path: request.workspace_path.clone(),
            metadata: HashMap::new(),
        })
    }

    async fn stop_instance(&self, instance: &ExecutorInstance, _force: bool) -> Result<()> {
        let body = serde_json::json!({ "instance_port": instance.client.endpoint.addr_string() });
        http::post_authed(&self.controller_addr, "/api/v1/instances/delete", &body.to_string(), "")
            .await
            .map(|_| ())
    }

    /// The standalone backend's instances are transient — there's
    /// nothing durable on the controller side to reconstruct from.
    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[path = "standalone_tests.rs"]
mod tests;
