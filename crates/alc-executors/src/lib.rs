// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alc-executors: the four execution backends (standalone, local
//! container, remote container, remote cloud micro-sandbox) behind one
//! `ExecutorBackend` trait, plus the name-keyed registry the Manager
//! dispatches through.

pub mod backend;
pub mod cloud;
pub mod container;
pub mod http;
pub mod proxy;
pub mod registry;
pub mod remote_container;
pub mod standalone;

pub use backend::{CreateInstanceRequest, ExecutorBackend, RemoteSessionResumer, RemoteStatusProvider};
pub use cloud::CloudExecutor;
pub use container::ContainerExecutor;
pub use proxy::PortForward;
pub use registry::ExecutorRegistry;
pub use remote_container::RemoteContainerExecutor;
pub use standalone::StandaloneExecutor;
