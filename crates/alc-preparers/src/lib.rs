// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alc-preparers: environment preparation pipelines run before an
//! executor backend starts an agent session.
//!
//! [`LocalPreparer`] validates and runs a setup script for the
//! standalone backend; [`ValidatingPreparer`] does prerequisite checks
//! only for the container/cloud backends, which provision through their
//! executor backend instead. [`PreparerRegistry`] dispatches by
//! [`ExecutorKind`].

pub mod local;
pub mod preparer;
pub mod registry;
pub mod resolver;
pub mod template;
pub mod validating;

pub use local::LocalPreparer;
pub use preparer::{EnvPrepareRequest, EnvironmentPreparer, ExecutorKind};
pub use registry::PreparerRegistry;
pub use resolver::resolve_script;
pub use validating::ValidatingPreparer;
