// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps an executor kind to the preparer that handles it.

use crate::local::LocalPreparer;
use crate::preparer::{EnvironmentPreparer, ExecutorKind};
use crate::validating::ValidatingPreparer;
use std::collections::HashMap;
use std::sync::Arc;

pub struct PreparerRegistry {
    preparers: HashMap<ExecutorKind, Arc<dyn EnvironmentPreparer>>,
}

impl PreparerRegistry {
    /// Build the default registry: a [`LocalPreparer`] for the standalone
    /// backend, a shared [`ValidatingPreparer`] for every other kind.
    pub fn new() -> Self {
        let validating: Arc<dyn EnvironmentPreparer> = Arc::new(ValidatingPreparer::new());
        let mut preparers: HashMap<ExecutorKind, Arc<dyn EnvironmentPreparer>> = HashMap::new();
        preparers.insert(ExecutorKind::Standalone, Arc::new(LocalPreparer::new()));
        preparers.insert(ExecutorKind::Container, validating.clone());
        preparers.insert(ExecutorKind::RemoteContainer, validating.clone());
        preparers.insert(ExecutorKind::Cloud, validating);
        Self { preparers }
    }

    pub fn get(&self, kind: ExecutorKind) -> Option<Arc<dyn EnvironmentPreparer>> {
        self.preparers.get(&kind).cloned()
    }
}

impl Default for PreparerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
