// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine provisioning adapter.
//!
//! `MachineProvider` covers the three cloud operations the driver
//! needs: bulk spawn, single restart, batch terminate. Implementations
//! return raw provider results; timeout policy lives in the engine's
//! executor, and the post-reboot health verification is composed there
//! from this trait plus `HealthProbe`.

mod http;

pub use http::HttpMachineProvider;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMachineProvider, MachineCall};

use async_trait::async_trait;
use drender_core::{InstanceId, RenderInstance};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from machine provisioning operations
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("cloud API error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation timed out")]
    Timeout,

    #[error("requested {requested} machines, provider returned {returned}")]
    Shortfall { requested: u32, returned: usize },
}

/// Provisioning operations against the cloud provider.
#[async_trait]
pub trait MachineProvider: Clone + Send + Sync + 'static {
    /// Launch `count` machines from the given image. Blocks until the
    /// provider reports them running.
    async fn spawn(&self, cloud_ami: &str, count: u32) -> Result<Vec<RenderInstance>, MachineError>;

    /// Reboot one machine. Success means the provider accepted the
    /// reboot, not that the worker is serving again.
    async fn restart(&self, instance_id: &InstanceId) -> Result<(), MachineError>;

    /// Terminate a batch of machines, awaiting the provider's ack.
    async fn terminate(&self, instance_ids: &[InstanceId]) -> Result<(), MachineError>;
}

/// Wire request to the resource service. Payload fields vary by action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceRequest {
    SpawnMachines {
        #[serde(rename = "cloudAMI")]
        cloud_ami: String,
        count: u32,
    },
    RestartMachines { instances: Vec<InstanceId> },
    TerminateMachines { instances: Vec<InstanceId> },
}

/// Wire reply from the resource service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<RenderInstance>>,
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
