// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioned worker machines

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Cloud-assigned identifier of a worker machine.
    pub struct InstanceId;
}

/// Lifecycle state of a worker machine as last reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    Running,
    Rebooting,
    Terminated,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Pending => write!(f, "pending"),
            InstanceState::Running => write!(f, "running"),
            InstanceState::Rebooting => write!(f, "rebooting"),
            InstanceState::Terminated => write!(f, "terminated"),
        }
    }
}

/// A provisioned worker machine.
///
/// One instance may host several jobs: during recovery a single
/// replacement machine receives every residual sub-job of the failed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInstance {
    pub id: InstanceId,
    pub public_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    pub cloud_ami: String,
    pub state: InstanceState,
}

impl RenderInstance {
    pub fn new(
        id: impl Into<InstanceId>,
        public_ip: impl Into<String>,
        cloud_ami: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            public_ip: public_ip.into(),
            private_ip: None,
            cloud_ami: cloud_ami.into(),
            state: InstanceState::Running,
        }
    }
}
