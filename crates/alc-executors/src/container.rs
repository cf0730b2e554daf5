// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-container backend: runs the in-sandbox controller inside a
//! Docker container, reached over TCP once its port is published.

use crate::backend::{CreateInstanceRequest, ExecutorBackend};
use crate::http;
use alc_core::{ControllerEndpoint, Error, ExecutorInstance, InstanceClient, ProgressCallback, Result};
use std::collections::HashMap;
use std::time::Duration;

const CONTROLLER_PORT: u16 = 8080;
const HEALTH_POLL_ATTEMPTS: u32 = 30;
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ContainerExecutor {
    image: String,
}

impl ContainerExecutor {
    pub fn new(image: impl Into<String>) -> Self {
        Self { image: image.into() }
    }

    fn container_name(execution_id: &alc_core::ExecutionId) -> String {
        let full = execution_id.to_string();
        let short = &full[full.len().saturating_sub(8)..];
        format!("kandev-agent-{short}")
    }

    async fn discover_ip(&self, container_name: &str) -> Result<String> {
        let output = run_docker(&[
            "inspect",
            "-f",
            "{{range .NetworkSettings.Networks}}{{.IPAddress}}{{end}}",
            container_name,
        ])
        .await?;
        let ip = output.trim();
        if ip.is_empty() {
            Ok("127.0.0.1".to_string())
        } else {
            Ok(ip.to_string())
        }
    }

    async fn wait_for_health(&self, addr: &str) -> Result<()> {
        for attempt in 0..HEALTH_POLL_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
            }
            if http::get(addr, "/health").await.is_ok() {
                return Ok(());
            }
        }
        Err(Error::Controller(format!(
            "container controller at {addr} did not become healthy within {} attempts",
            HEALTH_POLL_ATTEMPTS
        )))
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for ContainerExecutor {
    fn name(&self) -> &str {
        "docker"
    }

    async fn health_check(&self) -> Result<()> {
        run_docker(&["version"]).await.map(|_| ())
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        let total = 4;
        let container_name = Self::container_name(&request.execution_id);

        on_progress("create container", 0, total);
        let port_mapping = format!("0:{CONTROLLER_PORT}");
        let managed_label = "label=kandev.managed=true".to_string();
        let instance_label = format!("label=kandev.instance_id={}", request.execution_id);
        let task_label = format!("label=kandev.task_id={}", request.task_id);
        let session_label = format!("label=kandev.session_id={}", request.session_id);
        let safe_dir_env = "GIT_CONFIG_COUNT=1";
        let safe_dir_val = "GIT_CONFIG_KEY_0=safe.directory";
        let safe_dir_set = "GIT_CONFIG_VALUE_0=*";

        let create_result = run_docker(&[
            "run",
            "-d",
            "--name",
            &container_name,
            "-p",
            &port_mapping,
            "-l",
            &managed_label,
            "-l",
            &instance_label,
            "-l",
            &task_label,
            "-l",
            &session_label,
            "-e",
            safe_dir_env,
            "-e",
            safe_dir_val,
            "-e",
            safe_dir_set,
            "-v",
            &format!("{}:/workspace", request.workspace_path),
            "-w",
            "/workspace",
            &self.image,
        ])
        .await;

        let container_id = match create_result {
            Ok(id) => id,
            Err(err) => {
                let _ = run_docker(&["rm", "-f", &container_name]).await;
                return Err(err);
            }
        };
        on_progress("create container", 1, total);

        on_progress("discover container ip", 1, total);
        let ip = self.discover_ip(&container_name).await.unwrap_or_else(|_| "127.0.0.1".to_string());
        on_progress("discover container ip", 2, total);

        on_progress("wait for controller health", 2, total);
        let health_addr = format!("{ip}:{CONTROLLER_PORT}");
        if let Err(err) = self.wait_for_health(&health_addr).await {
            let _ = run_docker(&["rm", "-f", &container_name]).await;
            return Err(err);
        }
        on_progress("wait for controller health", 3, total);

        on_progress("create instance", 3, total);
        let body = serde_json::json!({
            "execution_id": request.execution_id.to_string(),
            "session_id": request.session_id.as_str(),
            "workspace_path": "/workspace",
        });
        let response = match http::post_authed(&health_addr, "/api/v1/instances", &body.to_string(), "").await {
            Ok(body) => body,
            Err(err) => {
                let _ = run_docker(&["rm", "-f", &container_name]).await;
                return Err(err);
            }
        };
        let parsed: serde_json::Value = serde_json::from_str(&response)?;
        let port = parsed
            .get("port")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::Controller("create-instance response missing port".to_string()))? as u16;
        on_progress("create instance", total, total);

        let socket = format!("{ip}:{port}").parse().map_err(|e| {
            Error::Controller(format!("invalid instance address {ip}:{port}: {e}"))
        })?;

        Ok(ExecutorInstance {
            execution_id: request.execution_id.clone(),
            task_id: request.task_id.clone(),
            session_id: request.session_id.clone(),
            backend_name: self.name().to_string(),
            client: InstanceClient { endpoint: ControllerEndpoint::Socket(socket), auth_token: None },
            backend_ids: HashMap::from([("container_id".to_string(), container_id)]),
            workspace_path: request.workspace_path.clone(),
            metadata: HashMap::new(),
        })
    }

    async fn stop_instance(&self, instance: &ExecutorInstance, force: bool) -> Result<()> {
        let container_name = instance
            .backend_ids
            .get("container_id")
            .cloned()
            .unwrap_or_else(|| Self::container_name(&instance.execution_id));
        if force {
            run_docker(&["rm", "-f", &container_name]).await.map(|_| ())
        } else {
            run_docker(&["stop", &container_name]).await.map(|_| ())
        }
    }

    /// Enumerate containers labeled `kandev.managed=true`, skip any that
    /// aren't running, and reconstruct an instance per remaining
    /// container from its labels.
    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        let ids_output = run_docker(&[
            "ps",
            "-a",
            "--filter",
            "label=kandev.managed=true",
            "--format",
            "{{.ID}}\t{{.State}}",
        ])
        .await?;

        let mut instances = Vec::new();
        for line in ids_output.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.splitn(2, '\t');
            let Some(container_id) = fields.next() else { continue };
            let state = fields.next().unwrap_or_default();
            if state != "running" {
                tracing::debug!(container_id, state, "skipping non-running managed container");
                continue;
            }
            if let Some(instance) = self.recover_one(container_id).await {
                instances.push(instance);
            }
        }
        Ok(instances)
    }
}

impl ContainerExecutor {
    async fn recover_one(&self, container_id: &str) -> Option<ExecutorInstance> {
        let labels_output = run_docker(&[
            "inspect",
            "-f",
            "{{index .Config.Labels \"kandev.instance_id\"}}\t{{index .Config.Labels \"kandev.task_id\"}}\t{{index .Config.Labels \"kandev.session_id\"}}",
            container_id,
        ])
        .await
        .ok()?;
        let Some((instance_id, task_id, session_id)) = parse_recovery_labels(&labels_output) else {
            tracing::warn!(container_id, "skipping managed container with missing recovery labels");
            return None;
        };

        let ip = self.discover_ip(container_id).await.ok()?;
        tracing::info!(container_id, %ip, "recovered managed container");

        Some(ExecutorInstance {
            execution_id: alc_core::ExecutionId::from_string(instance_id),
            task_id: alc_core::TaskId::from_string(task_id),
            session_id: alc_core::SessionId::new(session_id),
            backend_name: self.name().to_string(),
            client: InstanceClient {
                endpoint: ControllerEndpoint::Socket(format!("{ip}:{CONTROLLER_PORT}").parse().ok()?),
                auth_token: None,
            },
            backend_ids: HashMap::from([("container_id".to_string(), container_id.to_string())]),
            workspace_path: "/workspace".to_string(),
            metadata: HashMap::new(),
        })
    }
}

/// Parse the tab-separated `instance_id\ttask_id\tsession_id` line
/// produced by the label-inspection template, rejecting containers
/// missing the labels this backend itself sets.
fn parse_recovery_labels(output: &str) -> Option<(String, String, String)> {
    let mut fields = output.trim().split('\t');
    let instance_id = fields.next()?.to_string();
    let task_id = fields.next()?.to_string();
    let session_id = fields.next()?.to_string();
    if instance_id.is_empty() || task_id.is_empty() || session_id.is_empty() {
        return None;
    }
    Some((instance_id, task_id, session_id))
}

/// Run a docker CLI command and return trimmed stdout on success.
async fn run_docker(args: &[&str]) -> Result<String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::Provisioning(format!("failed to exec docker: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Provisioning(format!(
            "docker {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        )))
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
