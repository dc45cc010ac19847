// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for scheduled ticks.
//!
//! TimerId names a scheduled tick: per-instance heartbeat probes and
//! per-project completion sweeps.

use crate::instance::InstanceId;
use crate::project::ProjectId;

crate::define_id! {
    /// Unique identifier for a scheduled timer.
    pub struct TimerId;
}

const HEARTBEAT_PREFIX: &str = "heartbeat:";
const SWEEP_PREFIX: &str = "sweep:";

impl TimerId {
    /// Timer ID for the periodic liveness probe of an instance.
    pub fn heartbeat(instance_id: &InstanceId) -> Self {
        Self::new(format!("{HEARTBEAT_PREFIX}{instance_id}"))
    }

    /// Timer ID for the periodic completion sweep of a project.
    pub fn sweep(project_id: &ProjectId) -> Self {
        Self::new(format!("{SWEEP_PREFIX}{project_id}"))
    }

    /// The instance this heartbeat timer monitors, if it is one.
    pub fn heartbeat_instance(&self) -> Option<InstanceId> {
        self.0
            .strip_prefix(HEARTBEAT_PREFIX)
            .map(InstanceId::from)
    }

    /// The project this sweep timer scans, if it is one.
    pub fn sweep_project(&self) -> Option<ProjectId> {
        self.0.strip_prefix(SWEEP_PREFIX).map(ProjectId::from)
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
