// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote micro-sandbox backend: provisions a cloud-hosted sandbox via
//! the `sprites` CLI, uploads the controller binary, runs the prepare
//! script inside it, and opens a local port forward to the resulting
//! instance.

use crate::backend::{CreateInstanceRequest, ExecutorBackend};
use crate::proxy::PortForward;
use alc_core::{ControllerEndpoint, Error, ExecutionId, ExecutorInstance, InstanceClient, ProgressCallback, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

const CONTROLLER_PORT: u16 = 8080;
const CONTROLLER_BINARY_NAME: &str = "agentctl-linux-amd64";
const CONTROLLER_BINARY_ENV_VAR: &str = "KANDEV_AGENTCTL_LINUX_BINARY";
const CONTROLLER_REMOTE_PATH: &str = "/usr/local/bin/agentctl-linux-amd64";
const TAIL_LINES: usize = 20;
const HEALTH_DEADLINE: Duration = Duration::from_secs(15);
const HEALTH_BACKOFF: Duration = Duration::from_millis(500);

pub struct CloudExecutor {
    /// `execution-id` -> API token, so `stop_instance` can destroy the
    /// sandbox without the caller re-supplying credentials.
    tokens: Mutex<HashMap<ExecutionId, String>>,
    /// `execution-id` -> open local port forward.
    forwards: Mutex<HashMap<ExecutionId, PortForward>>,
}

impl CloudExecutor {
    pub fn new() -> Self {
        Self { tokens: Mutex::new(HashMap::new()), forwards: Mutex::new(HashMap::new()) }
    }

    fn cache_token(&self, execution_id: &ExecutionId, token: String) {
        self.tokens.lock().insert(execution_id.clone(), token);
    }

    fn cached_token(&self, execution_id: &ExecutionId) -> Option<String> {
        self.tokens.lock().get(execution_id).cloned()
    }

    fn evict_token(&self, execution_id: &ExecutionId) {
        self.tokens.lock().remove(execution_id);
    }

    fn cache_forward(&self, execution_id: &ExecutionId, forward: PortForward) {
        self.forwards.lock().insert(execution_id.clone(), forward);
    }

    fn take_forward(&self, execution_id: &ExecutionId) -> Option<PortForward> {
        self.forwards.lock().remove(execution_id)
    }

    /// Best-effort rollback: tear down anything created so far and
    /// destroy the sandbox, logging failures rather than propagating
    /// them, since the caller already has the real error to report.
    async fn rollback(&self, execution_id: &ExecutionId, sandbox_id: &str, token: &str) {
        if let Some(forward) = self.take_forward(execution_id) {
            forward.close();
        }
        self.evict_token(execution_id);
        if let Err(err) = run_sprites(&["sandbox", "destroy", sandbox_id, "--token", token]).await {
            tracing::warn!(%err, sandbox_id, "failed to destroy sandbox during rollback");
        }
    }
}

impl Default for CloudExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for CloudExecutor {
    fn name(&self) -> &str {
        "sprites-cloud"
    }

    async fn health_check(&self) -> Result<()> {
        run_sprites(&["version"]).await.map(|_| ())
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ExecutorInstance> {
        let total = 7;
        let token = resolve_api_token(request)?;

        // Step 1: create sandbox.
        on_progress("create sandbox", 0, total);
        let sandbox_id = run_sprites(&["sandbox", "create", "--token", &token]).await?;
        self.cache_token(&request.execution_id, token.clone());
        on_progress("create sandbox", 1, total);

        // Step 2: upload controller binary.
        on_progress("upload controller binary", 1, total);
        if let Err(err) = upload_controller_binary(request, &sandbox_id, &token).await {
            self.rollback(&request.execution_id, &sandbox_id, &token).await;
            return Err(err);
        }
        on_progress("upload controller binary", 2, total);

        // Step 3: run prepare script.
        on_progress("run prepare script", 2, total);
        if let Err(err) = run_prepare_script(request, &sandbox_id, &token).await {
            self.rollback(&request.execution_id, &sandbox_id, &token).await;
            return Err(err);
        }
        on_progress("run prepare script", 3, total);

        // Step 4: wait for controller health.
        on_progress("wait for controller health", 3, total);
        if let Err(err) = wait_for_health(&sandbox_id, &token).await {
            self.rollback(&request.execution_id, &sandbox_id, &token).await;
            return Err(err);
        }
        on_progress("wait for controller health", 4, total);

        // Step 5: create agent instance.
        on_progress("create instance", 4, total);
        let port = match create_instance_in_sandbox(request, &sandbox_id, &token).await {
            Ok(port) => port,
            Err(err) => {
                self.rollback(&request.execution_id, &sandbox_id, &token).await;
                return Err(err);
            }
        };
        on_progress("create instance", 5, total);

        // Step 6: apply network policy (best-effort).
        on_progress("apply network policy", 5, total);
        if let Some(policy) = request.metadata.network_policy() {
            if let Err(err) = run_sprites(&[
                "sandbox",
                "network-policy",
                &sandbox_id,
                "--token",
                &token,
                "--rules",
                &policy.to_string(),
            ])
            .await
            {
                tracing::warn!(%err, sandbox_id, "network policy application failed, continuing");
            }
        }
        on_progress("apply network policy", 6, total);

        // Step 7: set up port forwarding.
        on_progress("set up port forwarding", 6, total);
        let remote_addr = format!("{sandbox_id}:{port}");
        let forward = match PortForward::open(remote_addr, Some(token.clone())).await {
            Ok(forward) => forward,
            Err(err) => {
                self.rollback(&request.execution_id, &sandbox_id, &token).await;
                return Err(err);
            }
        };
        let local_port = forward.local_port();
        self.cache_forward(&request.execution_id, forward);
        on_progress("set up port forwarding", total, total);

        Ok(ExecutorInstance {
            execution_id: request.execution_id.clone(),
            task_id: request.task_id.clone(),
            session_id: request.session_id.clone(),
            backend_name: self.name().to_string(),
            client: InstanceClient {
                endpoint: ControllerEndpoint::LocalPort(local_port),
                auth_token: Some(token),
            },
            backend_ids: HashMap::from([("sandbox_id".to_string(), sandbox_id)]),
            workspace_path: request.workspace_path.clone(),
            metadata: HashMap::new(),
        })
    }

    async fn stop_instance(&self, instance: &ExecutorInstance, _force: bool) -> Result<()> {
        let Some(sandbox_id) = instance.backend_ids.get("sandbox_id") else {
            return Err(Error::Controller("instance has no cached sandbox id".to_string()));
        };
        if let Some(forward) = self.take_forward(&instance.execution_id) {
            forward.close();
        }
        let token = self.cached_token(&instance.execution_id).or_else(|| instance.client.auth_token.clone());
        self.evict_token(&instance.execution_id);
        let Some(token) = token else {
            return Err(Error::Controller("no cached API token for sandbox destroy".to_string()));
        };
        run_sprites(&["sandbox", "destroy", sandbox_id, "--token", &token]).await.map(|_| ())
    }

    /// Port forwards don't survive a process restart, so there is
    /// nothing local to reconstruct from; re-attaching a still-live
    /// sandbox is future `RemoteSessionResumer` territory, not recovery.
    async fn recover_instances(&self) -> Result<Vec<ExecutorInstance>> {
        Ok(Vec::new())
    }
}

fn resolve_api_token(request: &CreateInstanceRequest) -> Result<String> {
    if let Some(token) = request.credentials.get("SPRITES_API_TOKEN") {
        return Ok(token.clone());
    }
    if let Some(token) = request.metadata.cloud_api_token() {
        return Ok(token.to_string());
    }
    Err(Error::Config("cloud executor requires SPRITES_API_TOKEN in the request's credential map".to_string()))
}

async fn upload_controller_binary(request: &CreateInstanceRequest, sandbox_id: &str, token: &str) -> Result<()> {
    let local_path = resolve_controller_binary(request)?;
    run_sprites(&[
        "sandbox",
        "upload",
        sandbox_id,
        "--token",
        token,
        local_path.to_str().ok_or_else(|| Error::Config("controller binary path is not valid UTF-8".to_string()))?,
        CONTROLLER_REMOTE_PATH,
        "--mode",
        "0755",
    ])
    .await?;
    run_sprites(&["sandbox", "exec", sandbox_id, "--token", token, "--", "test", "-x", CONTROLLER_REMOTE_PATH]).await?;
    Ok(())
}

/// Resolution order: an explicit metadata override, then
/// `KANDEV_AGENTCTL_LINUX_BINARY` (fatal if set but the file is missing),
/// then three fixed candidates relative to the current executable.
fn resolve_controller_binary(request: &CreateInstanceRequest) -> Result<PathBuf> {
    if let Some(path) = request.metadata.controller_binary_override() {
        return Ok(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(CONTROLLER_BINARY_ENV_VAR) {
        let path = PathBuf::from(path);
        return if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("{CONTROLLER_BINARY_ENV_VAR} set to {path:?} but file does not exist")))
        };
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .ok_or_else(|| Error::Config("could not determine current executable directory".to_string()))?;
    let candidates = [
        exe_dir.join(CONTROLLER_BINARY_NAME),
        exe_dir.join("..").join("build").join(CONTROLLER_BINARY_NAME),
        exe_dir.join("..").join("bin").join(CONTROLLER_BINARY_NAME),
    ];
    candidates
        .into_iter()
        .find(|c| c.exists())
        .ok_or_else(|| Error::Config(format!("no controller binary found; tried {candidates:?}")))
}

/// Run the prepare script inside the sandbox with stdout and stderr read
/// concurrently — never one fully drained before the other starts, which
/// would hide stderr output until the script's stdout closes.
async fn run_prepare_script(request: &CreateInstanceRequest, sandbox_id: &str, token: &str) -> Result<()> {
    let prepare_request = build_prepare_request(request);
    let Some(script) = alc_preparers::resolve_script(&prepare_request) else {
        return Ok(());
    };

    let child = tokio::process::Command::new("sprites")
        .args(["sandbox", "exec", sandbox_id, "--token", token, "--", "sh", "-c", &script])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Provisioning(format!("failed to exec prepare script: {e}")))?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| Error::Provisioning(format!("failed to wait on prepare script: {e}")))?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if !output.status.success() {
        return Err(Error::Provisioning(format!(
            "prepare script exited with {}; tail:\n{}",
            output.status,
            tail_lines(&combined, TAIL_LINES)
        )));
    }
    Ok(())
}

fn build_prepare_request(request: &CreateInstanceRequest) -> alc_preparers::EnvPrepareRequest {
    let mut prepare_request = alc_preparers::EnvPrepareRequest::new(
        request.task_id.clone(),
        request.session_id.clone(),
        alc_preparers::ExecutorKind::Cloud,
    );
    prepare_request.workspace_path = Some(request.workspace_path.clone());
    prepare_request.worktree_enabled = request.metadata.worktree_enabled();
    prepare_request.worktree_branch = request.metadata.worktree_branch().map(str::to_string);
    prepare_request.setup_script = request.metadata.setup_script().map(str::to_string);
    prepare_request.metadata = request.metadata.clone();
    prepare_request
}

/// Last `n` non-empty lines of `text`, for surfacing a bounded tail in
/// progress events and errors instead of the full buffered output.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

async fn wait_for_health(sandbox_id: &str, token: &str) -> Result<()> {
    let deadline = tokio::time::Instant::now() + HEALTH_DEADLINE;
    let health_addr = format!("http://127.0.0.1:{CONTROLLER_PORT}/health");
    loop {
        let result = run_sprites(&["sandbox", "exec", sandbox_id, "--token", token, "--", "curl", "-fsS", &health_addr]).await;
        if result.is_ok() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Controller(format!(
                "sandbox {sandbox_id} controller did not become healthy within {HEALTH_DEADLINE:?}"
            )));
        }
        tokio::time::sleep(HEALTH_BACKOFF).await;
    }
}

async fn create_instance_in_sandbox(request: &CreateInstanceRequest, sandbox_id: &str, token: &str) -> Result<u16> {
    let body = serde_json::json!({
        "execution_id": request.execution_id.to_string(),
        "session_id": request.session_id.as_str(),
        "workspace_path": request.workspace_path,
    });
    let response = run_sprites(&[
        "sandbox",
        "exec",
        sandbox_id,
        "--token",
        token,
        "--",
        "curl",
        "-fsS",
        "-X",
        "POST",
        "-H",
        "Content-Type: application/json",
        "-d",
        &body.to_string(),
        &format!("http://127.0.0.1:{CONTROLLER_PORT}/api/v1/instances"),
    ])
    .await?;
    let parsed: serde_json::Value = serde_json::from_str(&response)?;
    parsed
        .get("port")
        .and_then(serde_json::Value::as_u64)
        .map(|p| p as u16)
        .ok_or_else(|| Error::Controller("create-instance response missing port".to_string()))
}

/// Run a `sprites` CLI command and return trimmed stdout on success.
async fn run_sprites(args: &[&str]) -> Result<String> {
    let output = tokio::process::Command::new("sprites")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::Provisioning(format!("failed to exec sprites: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Provisioning(format!("sprites {} failed: {}", args.first().unwrap_or(&""), stderr.trim())))
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
