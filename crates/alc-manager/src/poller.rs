// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background liveness polling for backends that expose remote state.
//!
//! Runs a ticker owned by the Manager; each tick iterates the live
//! execution table and calls `RemoteStatusProvider::remote_status` on
//! every execution whose backend implements the capability. A failed
//! poll is stored as an `error_message` on the cached entry rather than
//! dropped — the next tick gets another chance.

use crate::store::ExecutionStore;
use alc_core::{Clock, Execution, RemoteStatus, SessionId};
use alc_executors::ExecutorRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct RemoteStatusPoller<C: Clock> {
    store: Arc<ExecutionStore>,
    registry: Arc<ExecutorRegistry>,
    clock: C,
    poll_interval: Duration,
    statuses: Mutex<HashMap<SessionId, RemoteStatus>>,
}

impl<C: Clock> RemoteStatusPoller<C> {
    pub fn new(store: Arc<ExecutionStore>, registry: Arc<ExecutorRegistry>, clock: C, poll_interval: Duration) -> Self {
        Self { store, registry, clock, poll_interval, statuses: Mutex::new(HashMap::new()) }
    }

    /// Ticker loop. Exits on either the Manager's stop signal or the
    /// caller's cancellation token, matching the two ways every other
    /// suspension point in this core can be torn down.
    pub async fn run(&self, mut stop_rx: tokio::sync::oneshot::Receiver<()>, cancellation: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.tick().await; // first tick fires immediately; skip it, poll_once runs it explicitly if wanted
        loop {
            tokio::select! {
                _ = interval.tick() => self.poll_once().await,
                _ = &mut stop_rx => {
                    tracing::debug!("remote status poller stopped");
                    return;
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("remote status poller cancelled");
                    return;
                }
            }
        }
    }

    /// One poll cycle over every live execution.
    pub async fn poll_once(&self) {
        for execution in self.store.list() {
            self.refresh_one(&execution).await;
        }
    }

    /// One-shot poll over caller-supplied records, used at startup before
    /// sessions are lazily resumed into the live store.
    pub async fn poll_remote_status_for_records(&self, records: &[Arc<Execution>]) {
        for execution in records {
            self.refresh_one(execution).await;
        }
    }

    /// Refreshes the cached entry for `session_id` if an execution still
    /// tracks it, then returns whatever snapshot is cached (stale or
    /// fresh, or absent if this session was never polled).
    pub async fn get_remote_status_by_session_id(&self, session_id: &SessionId) -> Option<RemoteStatus> {
        if let Some(execution) = self.store.get_by_session_id(session_id) {
            self.refresh_one(&execution).await;
        }
        self.get_remote_status(session_id)
    }

    pub fn get_remote_status(&self, session_id: &SessionId) -> Option<RemoteStatus> {
        self.statuses.lock().get(session_id).map(RemoteStatus::snapshot)
    }

    async fn refresh_one(&self, execution: &Arc<Execution>) {
        let backend_name = execution.with_entry(|entry| entry.backend_name.clone());
        let Some(backend) = self.registry.get(&backend_name) else {
            return;
        };
        let Some(provider) = backend.as_remote_status_provider() else {
            return;
        };

        let now = self.clock.epoch_ms();
        match provider.remote_status(&execution.session_id).await {
            Ok(status) => {
                self.statuses.lock().insert(execution.session_id.clone(), status);
            }
            Err(e) => {
                let mut statuses = self.statuses.lock();
                let entry = statuses.entry(execution.session_id.clone()).or_insert_with(|| RemoteStatus {
                    backend_name: backend_name.clone(),
                    remote_name: execution.session_id.as_str().to_string(),
                    state: "unknown".to_string(),
                    created_at_ms: now,
                    last_checked_at_ms: now,
                    error_message: None,
                    details: HashMap::new(),
                });
                entry.last_checked_at_ms = now;
                entry.error_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
