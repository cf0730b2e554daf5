// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory execution table, indexed by both execution-id and
//! session-id. `List` hands back live `Arc<Execution>` pointers —
//! callers mutate only through `Execution`'s own locked accessors, never
//! by reaching into a listed entry directly.

use alc_core::{Error, Execution, ExecutionEntry, ExecutionId, Result, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ExecutionStore {
    by_execution: Mutex<HashMap<ExecutionId, Arc<Execution>>>,
    by_session: Mutex<HashMap<SessionId, ExecutionId>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created execution. Fails if its session-id is
    /// already bound to another live execution — a session maps
    /// one-to-one to an execution while live.
    pub fn insert(&self, execution: Arc<Execution>) -> Result<()> {
        let mut by_session = self.by_session.lock();
        if by_session.contains_key(&execution.session_id) {
            return Err(Error::DuplicateSession(execution.session_id.clone()));
        }
        by_session.insert(execution.session_id.clone(), execution.execution_id.clone());
        self.by_execution.lock().insert(execution.execution_id.clone(), execution);
        Ok(())
    }

    pub fn get(&self, id: &ExecutionId) -> Option<Arc<Execution>> {
        self.by_execution.lock().get(id).cloned()
    }

    pub fn get_by_session_id(&self, session_id: &SessionId) -> Option<Arc<Execution>> {
        let execution_id = self.by_session.lock().get(session_id).cloned()?;
        self.get(&execution_id)
    }

    /// Exclusive access to one execution's entry-locked fields, looked up
    /// by execution id.
    pub fn with_entry<R>(&self, id: &ExecutionId, f: impl FnOnce(&mut ExecutionEntry) -> R) -> Option<R> {
        self.get(id).map(|execution| execution.with_entry(f))
    }

    pub fn remove(&self, id: &ExecutionId) -> Option<Arc<Execution>> {
        let execution = self.by_execution.lock().remove(id)?;
        self.by_session.lock().remove(&execution.session_id);
        Some(execution)
    }

    /// Snapshot of every live execution, in no particular order.
    pub fn list(&self) -> Vec<Arc<Execution>> {
        self.by_execution.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_execution.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
