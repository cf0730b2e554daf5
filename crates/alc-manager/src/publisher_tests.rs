// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use alc_core::SessionId;
use tokio::sync::mpsc;

#[tokio::test]
async fn publish_forwards_events_with_a_session_id() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let publisher = EventPublisher::new(Arc::new(tx));
    publisher.publish(Event::AgentStarted { session_id: SessionId::new("session-a") });
    let received = rx.recv().await.expect("event delivered");
    assert_eq!(received.session_id().as_str(), "session-a");
}

#[tokio::test]
async fn publish_drops_events_with_an_empty_session_id() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let publisher = EventPublisher::new(Arc::new(tx));
    publisher.publish(Event::AgentStarted { session_id: SessionId::new("") });
    drop(publisher);
    assert!(rx.recv().await.is_none());
}

#[test]
fn sink_publish_does_not_panic_on_a_closed_channel() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let publisher = EventPublisher::new(Arc::new(tx));
    publisher.publish(Event::AgentStarted { session_id: SessionId::new("session-b") });
}
