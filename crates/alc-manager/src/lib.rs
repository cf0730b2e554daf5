// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alc-manager: the composition root. Wires the executor and preparer
//! registries, the execution store, the event publisher, the stream
//! ingestor, the session protocol driver, and the remote-status poller
//! into the public lifecycle operations (`start_agent`, `prompt_agent`,
//! `cancel_agent`, `stop_agent`, `respond_to_permission`) every surface
//! above this core calls into.

pub mod config;
pub mod controller;
pub mod ingestor;
pub mod manager;
pub mod poller;
pub mod publisher;
pub mod session;
pub mod store;

pub use config::ManagerConfig;
pub use controller::{
    AgentEvent, AgentEventHandler, AgentIdentity, ControllerClient, ControllerClientFactory, CreatedInstance,
    McpServerDescriptor, WorkspaceEvent, WorkspaceEventHandler,
};
pub use ingestor::{mark_completed, mark_ready, StreamIngestor};
pub use manager::{Manager, StartAgentRequest};
pub use poller::RemoteStatusPoller;
pub use publisher::{EventPublisher, EventSink};
pub use session::{SessionInitOutcome, SessionInitRequest, SessionManager};
pub use store::ExecutionStore;
