// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent side effects the driver needs performed.
//!
//! Handlers return effects; the executor runs them. Cloud effects run
//! on the bounded worker pool and report completion by posting an
//! `Event` back onto the driver loop, so the executor never touches
//! the state store.

use crate::instance::{InstanceId, RenderInstance};
use crate::job::{JobId, RenderJob};
use crate::source::S3Source;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Effects executed by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Health-probe an instance (30 s budget).
    ProbeInstance { instance: RenderInstance },

    /// Reboot a machine and re-verify health; on success the carried
    /// residual jobs are rebound to it.
    RestartMachine {
        instance: RenderInstance,
        job_ids: Vec<JobId>,
    },

    /// Provision one replacement machine for a failed instance; on
    /// success the carried residual jobs are bound to it.
    SpawnReplacement {
        cloud_ami: String,
        replaces: InstanceId,
        job_ids: Vec<JobId>,
    },

    /// Terminate a batch of machines at the provider.
    TerminateMachines { instance_ids: Vec<InstanceId> },

    /// Confirm a reported frame object exists in the store before it
    /// counts as progress.
    VerifyFrame {
        job_id: JobId,
        frames: Vec<i32>,
        uri: S3Source,
    },

    /// Send a START message for a job to the worker on an instance.
    DispatchJob {
        job: RenderJob,
        instance: RenderInstance,
    },

    /// Set a timer.
    SetTimer {
        id: TimerId,
        #[serde(with = "duration_serde")]
        duration: Duration,
    },

    /// Cancel a timer.
    CancelTimer { id: TimerId },
}

impl Effect {
    /// Effect name for log spans (e.g., "probe_instance").
    pub fn name(&self) -> &'static str {
        match self {
            Effect::ProbeInstance { .. } => "probe_instance",
            Effect::RestartMachine { .. } => "restart_machine",
            Effect::SpawnReplacement { .. } => "spawn_replacement",
            Effect::TerminateMachines { .. } => "terminate_machines",
            Effect::VerifyFrame { .. } => "verify_frame",
            Effect::DispatchJob { .. } => "dispatch_job",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::ProbeInstance { instance } => vec![
                ("instance_id", instance.id.to_string()),
                ("public_ip", instance.public_ip.clone()),
            ],
            Effect::RestartMachine { instance, job_ids } => vec![
                ("instance_id", instance.id.to_string()),
                ("jobs", job_ids.len().to_string()),
            ],
            Effect::SpawnReplacement {
                cloud_ami,
                replaces,
                job_ids,
            } => vec![
                ("cloud_ami", cloud_ami.clone()),
                ("replaces", replaces.to_string()),
                ("jobs", job_ids.len().to_string()),
            ],
            Effect::TerminateMachines { instance_ids } => {
                vec![("instances", instance_ids.len().to_string())]
            }
            Effect::VerifyFrame { job_id, frames, uri } => vec![
                ("job_id", job_id.to_string()),
                ("frames", frames.len().to_string()),
                ("uri", uri.to_string()),
            ],
            Effect::DispatchJob { job, instance } => vec![
                ("job_id", job.id.to_string()),
                ("range", job.range.to_string()),
                ("instance_id", instance.id.to_string()),
            ],
            Effect::SetTimer { id, duration } => vec![
                ("timer_id", id.to_string()),
                ("duration_ms", duration.as_millis().to_string()),
            ],
            Effect::CancelTimer { id } => vec![("timer_id", id.to_string())],
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
