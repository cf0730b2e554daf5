// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExecutorRegistry` — name-keyed lookup across every registered
//! backend, plus fan-out health-check and recovery sweeps the Manager
//! runs at startup.

use crate::backend::ExecutorBackend;
use alc_core::{ExecutorInstance, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ExecutorRegistry {
    backends: HashMap<String, Arc<dyn ExecutorBackend>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register(&mut self, backend: Arc<dyn ExecutorBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ExecutorBackend>> {
        self.backends.get(name).cloned()
    }

    /// Health-check every registered backend, returning the name of each
    /// one that failed along with its error — never short-circuits on
    /// the first failure, since the caller wants a full picture of which
    /// backends are unavailable.
    pub async fn health_check_all(&self) -> Vec<(String, alc_core::Error)> {
        let mut failures = Vec::new();
        for (name, backend) in &self.backends {
            if let Err(err) = backend.health_check().await {
                failures.push((name.clone(), err));
            }
        }
        failures
    }

    /// Recover instances from every registered backend, merging
    /// successful results and logging (not failing) any backend whose
    /// reconciliation sweep errors out.
    pub async fn recover_all(&self) -> Result<Vec<ExecutorInstance>> {
        let mut recovered = Vec::new();
        for (name, backend) in &self.backends {
            match backend.recover_instances().await {
                Ok(instances) => recovered.extend(instances),
                Err(err) => tracing::warn!(backend = %name, %err, "recovery sweep failed for backend"),
            }
        }
        Ok(recovered)
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
