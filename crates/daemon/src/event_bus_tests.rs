// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_core::{InstanceId, TimerId};

#[tokio::test]
async fn events_flow_in_order() {
    let (bus, mut reader) = EventBus::new(8);
    bus.send(Event::TimerFired {
        id: TimerId::heartbeat(&InstanceId::new("i-1")),
    })
    .await;
    bus.send(Event::InstanceKill {
        instance_id: InstanceId::new("i-2"),
    })
    .await;

    assert!(matches!(
        reader.recv().await,
        Some(Event::TimerFired { .. })
    ));
    assert!(matches!(
        reader.recv().await,
        Some(Event::InstanceKill { .. })
    ));
}

#[tokio::test]
async fn reader_closes_after_last_sender_drops() {
    let (bus, mut reader) = EventBus::new(1);
    let extra_tx = bus.sender();
    drop(bus);
    drop(extra_tx);
    assert!(reader.recv().await.is_none());
}
