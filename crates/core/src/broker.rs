// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-to-driver broker channel coordinates and payloads.

use crate::job::JobId;
use crate::source::S3Source;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default AMQP port of the broker.
pub const DEFAULT_BROKER_PORT: u16 = 5672;

/// Queue the driver consumes per-frame completion notifications from.
pub const DRIVER_FRAME_QUEUE: &str = "drender.driver.frames";

/// Connection coordinates of the worker-to-driver broker channel.
///
/// Driver-scoped: set once by the first START request and reused by
/// every later project. A START naming a different host is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerAddress {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_queue")]
    pub queue: String,
}

fn default_port() -> u16 {
    DEFAULT_BROKER_PORT
}

fn default_queue() -> String {
    DRIVER_FRAME_QUEUE.to_string()
}

impl BrokerAddress {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_BROKER_PORT,
            queue: DRIVER_FRAME_QUEUE.to_string(),
        }
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amqp://{}:{}/{}", self.host, self.port, self.queue)
    }
}

/// Per-frame completion notification consumed from the broker.
///
/// Workers may batch: `frames_rendered` lists additional confirmed
/// frames beyond `last_frame_rendered`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub job_id: JobId,
    pub last_frame_rendered: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_uri: Option<S3Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames_rendered: Vec<i32>,
}

impl FrameRecord {
    /// All frames this record confirms, `last_frame_rendered` included.
    pub fn frames(&self) -> Vec<i32> {
        let mut frames = self.frames_rendered.clone();
        if !frames.contains(&self.last_frame_rendered) {
            frames.push(self.last_frame_rendered);
        }
        frames
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
