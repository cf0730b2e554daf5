// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heterogeneous metadata bag carried on requests and instances.
//!
//! Retained as a typed variant map for interchange with external callers
//! (agent-type registry, CLI/HTTP surfaces above the Manager), but the
//! well-known keys used by this core get typed accessors so nothing in
//! this crate does a string-typed lookup twice.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Bool(bool),
    Json(serde_json::Value),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// Well-known metadata keys this core reads directly.
mod keys {
    pub const REPOSITORY_PATH: &str = "repository.path";
    pub const REPOSITORY_URL: &str = "repository.clone_url";
    pub const REPOSITORY_BRANCH: &str = "repository.branch";
    pub const WORKTREE_FLAG: &str = "worktree.enabled";
    pub const WORKTREE_ID: &str = "worktree.id";
    pub const WORKTREE_BRANCH: &str = "worktree.branch";
    pub const WORKTREE_BASE_BRANCH: &str = "worktree.base_branch";
    pub const WORKTREE_BASE_PATH: &str = "worktree.base_path";
    pub const WORKTREE_PATH: &str = "worktree.path";
    pub const SETUP_SCRIPT: &str = "setup_script";
    pub const GIT_IDENTITY_NAME: &str = "git.identity_name";
    pub const GIT_IDENTITY_EMAIL: &str = "git.identity_email";
    pub const REMOTE_CREDENTIALS_SELECTION: &str = "remote.credentials_selection";
    pub const NETWORK_POLICY: &str = "network_policy";
    pub const CLOUD_API_TOKEN: &str = "cloud.api_token";
    pub const CONTROLLER_BINARY_OVERRIDE: &str = "controller.binary_override";
}

/// Typed variant map keyed by dotted string keys (e.g. `repository.path`).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetadataBag(HashMap<String, MetadataValue>);

impl MetadataBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(MetadataValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(MetadataValue::as_bool)
    }

    pub fn repository_path(&self) -> Option<&str> {
        self.get_str(keys::REPOSITORY_PATH)
    }

    pub fn repository_clone_url(&self) -> Option<&str> {
        self.get_str(keys::REPOSITORY_URL)
    }

    pub fn repository_branch(&self) -> Option<&str> {
        self.get_str(keys::REPOSITORY_BRANCH)
    }

    pub fn worktree_enabled(&self) -> bool {
        self.get_bool(keys::WORKTREE_FLAG).unwrap_or(false)
    }

    pub fn worktree_id(&self) -> Option<&str> {
        self.get_str(keys::WORKTREE_ID)
    }

    pub fn worktree_branch(&self) -> Option<&str> {
        self.get_str(keys::WORKTREE_BRANCH)
    }

    pub fn worktree_base_branch(&self) -> Option<&str> {
        self.get_str(keys::WORKTREE_BASE_BRANCH)
    }

    pub fn worktree_base_path(&self) -> Option<&str> {
        self.get_str(keys::WORKTREE_BASE_PATH)
    }

    pub fn worktree_path(&self) -> Option<&str> {
        self.get_str(keys::WORKTREE_PATH)
    }

    pub fn setup_script(&self) -> Option<&str> {
        self.get_str(keys::SETUP_SCRIPT)
    }

    pub fn git_identity_name(&self) -> Option<&str> {
        self.get_str(keys::GIT_IDENTITY_NAME)
    }

    pub fn git_identity_email(&self) -> Option<&str> {
        self.get_str(keys::GIT_IDENTITY_EMAIL)
    }

    pub fn remote_credentials_selection(&self) -> Option<&str> {
        self.get_str(keys::REMOTE_CREDENTIALS_SELECTION)
    }

    pub fn network_policy(&self) -> Option<&serde_json::Value> {
        match self.0.get(keys::NETWORK_POLICY) {
            Some(MetadataValue::Json(v)) => Some(v),
            _ => None,
        }
    }

    pub fn cloud_api_token(&self) -> Option<&str> {
        self.get_str(keys::CLOUD_API_TOKEN)
    }

    pub fn controller_binary_override(&self) -> Option<&str> {
        self.get_str(keys::CONTROLLER_BINARY_OVERRIDE)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
