// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs: worker-assignable contiguous frame sub-ranges of a project.

use crate::broker::BrokerAddress;
use crate::frames::FrameRange;
use crate::instance::InstanceId;
use crate::project::ProjectId;
use crate::source::S3Source;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job, assigned by the state store on creation.
    pub struct JobId;
}

/// A job awaiting an id: the partitioner's output.
///
/// Sub-jobs inherit source, project, output URI, and broker coordinates
/// from their parent; the instance stays unset until the driver binds
/// one after provisioning resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSeed {
    pub project_id: ProjectId,
    pub range: FrameRange,
    pub source: S3Source,
    pub output_uri: Option<S3Source>,
    pub broker: BrokerAddress,
}

impl JobSeed {
    pub fn into_job(self, id: JobId, epoch_ms: u64) -> RenderJob {
        RenderJob {
            id,
            project_id: self.project_id,
            range: self.range,
            source: self.source,
            output_uri: self.output_uri,
            instance_id: None,
            is_active: true,
            broker: self.broker,
            created_at_ms: epoch_ms,
        }
    }
}

/// A job instance.
///
/// A job is active while it is the authoritative assignment for its
/// frame range. Deactivation is one-way; deactivated jobs are kept as
/// history and their frame progress still counts toward project
/// completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    pub project_id: ProjectId,
    pub range: FrameRange,
    pub source: S3Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_uri: Option<S3Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
    pub is_active: bool,
    pub broker: BrokerAddress,
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
