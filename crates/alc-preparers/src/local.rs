// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-process preparer: validates the workspace, then optionally runs
//! a setup script in it. The only preparer that actually executes
//! anything — container and cloud preparers just validate, leaving
//! provisioning to their executor backend.

use crate::preparer::{EnvPrepareRequest, EnvironmentPreparer};
use crate::resolver::resolve_script;
use alc_core::{Clock, Error, PrepareResult, PrepareStep, ProgressCallback, Result, SystemClock};
use tokio::process::Command;

pub struct LocalPreparer {
    clock: SystemClock,
}

impl LocalPreparer {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for LocalPreparer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EnvironmentPreparer for LocalPreparer {
    async fn prepare(&self, request: &EnvPrepareRequest, on_progress: ProgressCallback<'_>) -> Result<PrepareResult> {
        let started = std::time::Instant::now();
        let script = resolve_script(request);
        let total_steps = if script.is_some() { 2 } else { 1 };
        let mut steps = Vec::new();

        on_progress("validate workspace", 0, total_steps);
        steps.push(self.validate_workspace(request)?);
        on_progress("validate workspace", 1, total_steps);

        let Some(script) = script else {
            return Ok(PrepareResult::new(steps, started.elapsed()));
        };

        on_progress("run setup script", 1, total_steps);
        let workspace_path = request.workspace_path.as_deref().unwrap_or(".");
        steps.push(self.run_setup_script(workspace_path, &script).await);
        on_progress("run setup script", total_steps, total_steps);

        Ok(PrepareResult::new(steps, started.elapsed()))
    }
}

impl LocalPreparer {
    fn validate_workspace(&self, request: &EnvPrepareRequest) -> Result<PrepareStep> {
        let start = PrepareStep::start("validate_workspace", self.clock.epoch_ms());
        if request.workspace_path.is_none() && request.repository_path.is_none() {
            return Err(Error::Config(
                "at least one of workspace path or repository path is required".to_string(),
            ));
        }
        let output = request.workspace_path.as_deref().or(request.repository_path.as_deref()).unwrap_or("");
        Ok(start.complete(output, self.clock.epoch_ms()))
    }

    /// Run the setup script under `sh -c`, capturing stdout+stderr
    /// combined. Script failure is non-fatal — it's recorded as a failed
    /// step but doesn't fail the overall prepare result.
    async fn run_setup_script(&self, workspace_path: &str, script: &str) -> PrepareStep {
        let start = PrepareStep::start("setup_script", self.clock.epoch_ms());
        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .current_dir(workspace_path)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                start.complete(combined, self.clock.epoch_ms())
            }
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                tracing::warn!(workspace_path, "setup script exited non-zero");
                start.fail(combined, self.clock.epoch_ms())
            }
            Err(err) => {
                tracing::warn!(workspace_path, error = %err, "setup script failed to spawn");
                start.fail(err.to_string(), self.clock.epoch_ms())
            }
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
