// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote status snapshot returned by status-capable executor backends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub backend_name: String,
    pub remote_name: String,
    pub state: String,
    pub created_at_ms: u64,
    pub last_checked_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub details: HashMap<String, String>,
}

impl RemoteStatus {
    /// Deep copy — callers of the status cache must never observe a
    /// mutation of their snapshot reflected in a later read.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
#[path = "remote_status_tests.rs"]
mod tests;
