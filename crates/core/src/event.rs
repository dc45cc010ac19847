// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the DRender control plane.

use crate::broker::FrameRecord;
use crate::instance::{InstanceId, RenderInstance};
use crate::job::JobId;
use crate::source::S3Source;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};

/// Events that drive state transitions in the system.
///
/// Serializes with `{"type": "domain:verb", ...fields}` format. Probe
/// results, cloud-operation completions, and timer ticks all enter the
/// driver loop through this one type; handlers run on the loop thread
/// and are the only code that mutates the state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- timers --
    #[serde(rename = "timer:fired")]
    TimerFired { id: TimerId },

    // -- liveness --
    #[serde(rename = "instance:healthy")]
    InstanceHealthy { instance: RenderInstance },

    #[serde(rename = "instance:unhealthy")]
    InstanceUnhealthy { instance: RenderInstance },

    /// Operator-forced replacement: skip the restart leg entirely.
    #[serde(rename = "instance:replace")]
    InstanceReplace { instance: RenderInstance },

    /// Operator-forced termination of one instance.
    #[serde(rename = "instance:kill")]
    InstanceKill { instance_id: InstanceId },

    /// Probe an instance now, outside the periodic cadence.
    #[serde(rename = "instance:check")]
    InstanceCheck { instance_id: InstanceId },

    // -- cloud-operation completions --
    #[serde(rename = "machine:restarted")]
    MachineRestarted {
        instance: RenderInstance,
        /// Residual jobs to rebind to the rebooted machine.
        job_ids: Vec<JobId>,
    },

    #[serde(rename = "machine:restart-failed")]
    RestartFailed {
        instance: RenderInstance,
        job_ids: Vec<JobId>,
        error: String,
    },

    #[serde(rename = "machine:replaced")]
    ReplacementReady {
        /// The failed instance this machine replaces.
        replaces: InstanceId,
        instance: RenderInstance,
        job_ids: Vec<JobId>,
    },

    #[serde(rename = "machine:replace-failed")]
    ReplacementFailed {
        replaces: InstanceId,
        job_ids: Vec<JobId>,
        error: String,
    },

    #[serde(rename = "machines:terminated")]
    MachinesTerminated { instance_ids: Vec<InstanceId> },

    #[serde(rename = "machines:terminate-failed")]
    TerminateFailed {
        instance_ids: Vec<InstanceId>,
        error: String,
    },

    // -- frame progress --
    /// A per-frame completion notification arrived from the broker.
    #[serde(rename = "frame:reported")]
    FrameReported { record: FrameRecord },

    /// Object-store existence check finished for a reported frame.
    #[serde(rename = "frame:verified")]
    FrameVerified {
        job_id: JobId,
        frames: Vec<i32>,
        uri: S3Source,
        exists: bool,
    },
}

impl Event {
    /// Compact one-line description for loop logging.
    pub fn log_summary(&self) -> String {
        match self {
            Event::TimerFired { id } => format!("timer:fired {}", id),
            Event::InstanceHealthy { instance } => {
                format!("instance:healthy {}", instance.id)
            }
            Event::InstanceUnhealthy { instance } => {
                format!("instance:unhealthy {}", instance.id)
            }
            Event::InstanceReplace { instance } => {
                format!("instance:replace {}", instance.id)
            }
            Event::InstanceKill { instance_id } => format!("instance:kill {}", instance_id),
            Event::InstanceCheck { instance_id } => format!("instance:check {}", instance_id),
            Event::MachineRestarted { instance, job_ids } => {
                format!("machine:restarted {} jobs={}", instance.id, job_ids.len())
            }
            Event::RestartFailed {
                instance, error, ..
            } => format!("machine:restart-failed {} ({})", instance.id, error),
            Event::ReplacementReady {
                replaces,
                instance,
                job_ids,
            } => format!(
                "machine:replaced {} -> {} jobs={}",
                replaces,
                instance.id,
                job_ids.len()
            ),
            Event::ReplacementFailed {
                replaces, error, ..
            } => format!("machine:replace-failed {} ({})", replaces, error),
            Event::MachinesTerminated { instance_ids } => {
                format!("machines:terminated n={}", instance_ids.len())
            }
            Event::TerminateFailed {
                instance_ids,
                error,
            } => format!(
                "machines:terminate-failed n={} ({})",
                instance_ids.len(),
                error
            ),
            Event::FrameReported { record } => format!(
                "frame:reported job={} frame={}",
                record.job_id, record.last_frame_rendered
            ),
            Event::FrameVerified {
                job_id,
                frames,
                exists,
                ..
            } => format!(
                "frame:verified job={} n={} exists={}",
                job_id,
                frames.len(),
                exists
            ),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
