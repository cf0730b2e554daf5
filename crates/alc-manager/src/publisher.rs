// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event fan-out. A [`ControllerClient`] or stream ingestor never holds a
//! channel directly — every publish goes through an `EventPublisher`,
//! which enforces the one boundary invariant every caller shares (no
//! session-id, no publish) and logs before handing the event to whatever
//! sink the caller is running (a websocket fan-out, a test collector, ...).

use alc_core::Event;
use std::sync::Arc;

/// A destination for published events. Implementations own their own
/// delivery guarantees; a closed channel is not this core's problem.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<Event> {
    fn publish(&self, event: Event) {
        if let Err(e) = self.send(event) {
            tracing::warn!("event sink closed, dropping event: {}", e);
        }
    }
}

#[derive(Clone)]
pub struct EventPublisher {
    sink: Arc<dyn EventSink>,
}

impl EventPublisher {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Publish one event. A no-op when the event carries no session-id —
    /// there is no subscriber keyed to deliver it to.
    pub fn publish(&self, event: Event) {
        if event.session_id().as_str().is_empty() {
            return;
        }
        tracing::debug!(subject = %event.subject(), kind = event.kind(), "publishing event");
        self.sink.publish(event);
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
