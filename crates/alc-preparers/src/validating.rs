// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validate-only preparer shared by the container and cloud backends.
//!
//! Provisioning itself — creating the container, reserving the cloud
//! sandbox — is the executor backend's job; this preparer only checks
//! that the request carries what that provisioning step will need.

use crate::preparer::{EnvPrepareRequest, EnvironmentPreparer};
use alc_core::{Clock, Error, PrepareResult, PrepareStep, ProgressCallback, Result, SystemClock};

pub struct ValidatingPreparer {
    clock: SystemClock,
}

impl ValidatingPreparer {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for ValidatingPreparer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EnvironmentPreparer for ValidatingPreparer {
    async fn prepare(&self, request: &EnvPrepareRequest, on_progress: ProgressCallback<'_>) -> Result<PrepareResult> {
        let started = std::time::Instant::now();
        on_progress("validate prerequisites", 0, 1);

        let start = PrepareStep::start("validate_prerequisites", self.clock.epoch_ms());
        if request.workspace_path.is_none() && request.repository_path.is_none() {
            return Err(Error::Config(
                "at least one of workspace path or repository path is required".to_string(),
            ));
        }
        let step = start.complete("prerequisites present", self.clock.epoch_ms());

        on_progress("validate prerequisites", 1, 1);
        Ok(PrepareResult::new(vec![step], started.elapsed()))
    }
}

#[cfg(test)]
#[path = "validating_tests.rs"]
mod tests;
