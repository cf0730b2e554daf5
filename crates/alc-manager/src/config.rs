// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager configuration, resolved once at construction time from the
//! environment overrides this core touches (`GITHUB_TOKEN`,
//! `CLAUDE_CODE_OAUTH_TOKEN`, a `gh`-cli-detected token) plus the fixed
//! timing constants from the concurrency model — no repeated
//! `env::var` calls scattered through hot paths.

use std::time::Duration;

const UPDATES_STREAM_BARRIER: Duration = Duration::from_secs(5);
const INITIAL_PROMPT_DEADLINE: Duration = Duration::from_secs(10 * 60);
const PERMISSION_RESPONSE_DEADLINE: Duration = Duration::from_secs(30);
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(30);
const REMOTE_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub client_name: String,
    pub client_version: String,
    /// How long `InitializeAndPrompt` waits for the agent-event and
    /// workspace streams to be ready before issuing the first prompt.
    pub updates_stream_barrier: Duration,
    /// Deadline for a spawned initial prompt (the path that never had
    /// a synchronous caller to return to).
    pub initial_prompt_deadline: Duration,
    pub permission_response_deadline: Duration,
    pub stop_grace_period: Duration,
    pub remote_status_poll_interval: Duration,
    /// Injected into HTTPS clone URLs as `https://<token>@host/...`
    /// when present.
    pub github_token: Option<String>,
    /// Passed through to the backend's request env; never required.
    pub claude_code_oauth_token: Option<String>,
    pub gh_cli_token: Option<String>,
}

impl ManagerConfig {
    pub fn from_env() -> Self {
        Self {
            client_name: "kandev-core".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            updates_stream_barrier: UPDATES_STREAM_BARRIER,
            initial_prompt_deadline: INITIAL_PROMPT_DEADLINE,
            permission_response_deadline: PERMISSION_RESPONSE_DEADLINE,
            stop_grace_period: STOP_GRACE_PERIOD,
            remote_status_poll_interval: REMOTE_STATUS_POLL_INTERVAL,
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            claude_code_oauth_token: std::env::var("CLAUDE_CODE_OAUTH_TOKEN").ok(),
            gh_cli_token: detect_gh_cli_token(),
        }
    }
}

/// Best-effort detection of a `gh`-cli session token. Absence is not an
/// error — the token is never required, only passed through when found.
fn detect_gh_cli_token() -> Option<String> {
    let output = std::process::Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
