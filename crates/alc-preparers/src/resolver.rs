// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Setup script resolution: picking a script body and substituting its
//! placeholders from the prepare request.

use crate::preparer::{EnvPrepareRequest, ExecutorKind};
use crate::template::interpolate_shell;
use std::collections::HashMap;

/// Built-in default setup script used when the caller didn't supply one
/// and this request targets a worktree, a local checkout, or the
/// standalone backend.
const DEFAULT_SETUP_SCRIPT: &str = "\
{git.identity_setup}
{kandev.agentctl.install}
{kandev.agentctl.start}
";

/// Resolve the setup script body for `request`, with placeholders
/// substituted. Returns `None` when there's nothing to run.
pub fn resolve_script(request: &EnvPrepareRequest) -> Option<String> {
    let template = match &request.setup_script {
        Some(script) => script.clone(),
        None if request.worktree_enabled || request.executor_kind == ExecutorKind::Standalone => {
            DEFAULT_SETUP_SCRIPT.to_string()
        }
        None => return None,
    };

    if template.trim().is_empty() {
        return None;
    }

    Some(interpolate_shell(&template, &build_vars(request)))
}

fn build_vars(request: &EnvPrepareRequest) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    if let Some(path) = &request.workspace_path {
        vars.insert("workspace.path".to_string(), path.clone());
    }
    if let Some(path) = &request.repository_path {
        vars.insert("repository.path".to_string(), path.clone());
    }
    if let Some(branch) = &request.worktree_branch {
        vars.insert("worktree.branch".to_string(), branch.clone());
    }
    if let Some(path) = request.metadata.worktree_base_path() {
        vars.insert("worktree.base_path".to_string(), path.to_string());
    }
    if let Some(path) = request.metadata.worktree_path() {
        vars.insert("worktree.path".to_string(), path.to_string());
    }
    if let Some(id) = request.metadata.worktree_id() {
        vars.insert("worktree.id".to_string(), id.to_string());
    }
    if let Some(branch) = request.metadata.worktree_base_branch() {
        vars.insert("worktree.base_branch".to_string(), branch.to_string());
    }
    if let Some(branch) = request.metadata.repository_branch() {
        vars.insert("repository.branch".to_string(), branch.to_string());
    }
    if let Some(url) = request.metadata.repository_clone_url() {
        vars.insert("repository.clone_url".to_string(), clone_url_with_token(url));
    }

    let identity_setup = match (request.metadata.git_identity_name(), request.metadata.git_identity_email()) {
        (Some(name), Some(email)) => {
            format!("git config user.name '{name}' && git config user.email '{email}'")
        }
        _ => String::new(),
    };
    vars.insert("git.identity_setup".to_string(), identity_setup);

    vars.insert("kandev.agentctl.install".to_string(), "curl -fsSL https://get.kandev.dev/agentctl.sh | sh".to_string());
    vars.insert("kandev.agentctl.start".to_string(), "kandev-agentctl start --daemon".to_string());

    for (key, value) in &request.env {
        vars.insert(key.clone(), value.clone());
    }

    vars
}

/// Inject `GITHUB_TOKEN` as HTTP basic-auth credentials into a clone URL,
/// when the environment carries one and the URL doesn't already embed
/// credentials.
fn clone_url_with_token(url: &str) -> String {
    let Ok(token) = std::env::var("GITHUB_TOKEN") else {
        return url.to_string();
    };
    if token.is_empty() || url.contains('@') {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("https://") {
        return format!("https://x-access-token:{token}@{rest}");
    }
    url.to_string()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
