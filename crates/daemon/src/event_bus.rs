// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for daemon communication.
//!
//! A plain in-memory channel: the listener task, executor tasks, and
//! timer ticks all post events here; the driver loop drains it. State
//! is not durable by design, so there is nothing to replay on restart.

use drender_core::Event;
use tokio::sync::mpsc;

/// Sending half of the event bus.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<Event>,
}

/// Reader for the event bus, owned by the driver loop.
pub struct EventReader {
    rx: mpsc::Receiver<Event>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// Returns both the bus (for sending) and reader (for receiving).
    pub fn new(capacity: usize) -> (Self, EventReader) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, EventReader { rx })
    }

    /// Post an event for the driver loop.
    pub async fn send(&self, event: Event) {
        if self.tx.send(event).await.is_err() {
            tracing::warn!("driver loop gone, event dropped");
        }
    }

    /// Clone of the raw sender, for the executor's completion channel.
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }
}

impl EventReader {
    /// Wait for and return the next event.
    ///
    /// Returns `None` when the bus is closed (all senders dropped).
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
