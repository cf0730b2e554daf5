// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExecutorInstance` — handed from an Executor Backend to the Manager
//! after `CreateInstance`, then folded into an `Execution`.

use crate::ids::{ExecutionId, SessionId, TaskId};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Address at which the in-sandbox controller can be reached for this
/// instance, once provisioning completes.
#[derive(Debug, Clone)]
pub enum ControllerEndpoint {
    /// Local-process backend: a TCP port on loopback.
    LocalPort(u16),
    /// Container/cloud backends: a socket address (possibly a local
    /// port-forward bound to a remote instance).
    Socket(SocketAddr),
}

impl ControllerEndpoint {
    /// `host:port` form suitable for a raw TCP connect.
    pub fn addr_string(&self) -> String {
        match self {
            ControllerEndpoint::LocalPort(port) => format!("127.0.0.1:{port}"),
            ControllerEndpoint::Socket(addr) => addr.to_string(),
        }
    }
}

/// Client handle a backend hands back from `CreateInstance`; callers use
/// it to reach the newly provisioned controller.
#[derive(Debug, Clone)]
pub struct InstanceClient {
    pub endpoint: ControllerEndpoint,
    pub auth_token: Option<String>,
}

/// Transient record produced by `CreateInstance`, consumed by the Manager
/// to construct an `Execution`.
pub struct ExecutorInstance {
    pub execution_id: ExecutionId,
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub backend_name: String,
    pub client: InstanceClient,
    /// Backend-specific identifiers (container id, pod name, sandbox id…)
    pub backend_ids: HashMap<String, String>,
    pub workspace_path: String,
    pub metadata: HashMap<String, String>,
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
