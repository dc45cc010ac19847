// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame-notification feed from the worker-to-driver broker.
//!
//! The broker itself (AMQP, port 5672, queue `drender.driver.frames`)
//! is an external collaborator; the daemon consumes whatever feed it is
//! handed. `ChannelFrameFeed` backs the socket bridge and tests.

use async_trait::async_trait;
use drender_core::FrameRecord;
use tokio::sync::mpsc;

/// Source of per-frame completion notifications.
#[async_trait]
pub trait FrameFeed: Send + 'static {
    /// Next record, or `None` once the feed is closed.
    async fn next(&mut self) -> Option<FrameRecord>;
}

/// Feed backed by an in-process channel.
pub struct ChannelFrameFeed {
    rx: mpsc::Receiver<FrameRecord>,
}

/// Producer half of a `ChannelFrameFeed`.
#[derive(Clone)]
pub struct FrameFeedHandle {
    tx: mpsc::Sender<FrameRecord>,
}

impl ChannelFrameFeed {
    /// Create a feed and its producer handle.
    pub fn new(capacity: usize) -> (FrameFeedHandle, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (FrameFeedHandle { tx }, Self { rx })
    }
}

impl FrameFeedHandle {
    /// Publish a record. Fails silently once the consumer is gone.
    pub async fn publish(&self, record: FrameRecord) {
        if self.tx.send(record).await.is_err() {
            tracing::warn!("frame feed consumer dropped, record lost");
        }
    }
}

#[async_trait]
impl FrameFeed for ChannelFrameFeed {
    async fn next(&mut self) -> Option<FrameRecord> {
        self.rx.recv().await
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
