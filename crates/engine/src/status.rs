// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status snapshots served to callers.

use drender_core::{InstanceId, JobId, ProjectId, S3Source, SoftwareTag};
use drender_state::StateStore;
use serde::{Deserialize, Serialize};

/// Instance details surfaced in a job entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: InstanceId,
    /// Empty once the instance has been reaped.
    #[serde(default)]
    pub public_ip: String,
}

/// Per-job line of a project status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusEntry {
    pub id: JobId,
    pub start_frame: i32,
    pub end_frame: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceInfo>,
    pub is_active: bool,
    pub frames_rendered: usize,
}

/// Point-in-time view of a project, active and historical jobs included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub id: ProjectId,
    pub source: S3Source,
    pub start_frame: i32,
    pub end_frame: i32,
    pub software: SoftwareTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_uri: Option<S3Source>,
    pub is_complete: bool,
    pub jobs: Vec<JobStatusEntry>,
}

/// Build a snapshot from the store. Returns `None` for unknown projects.
pub fn project_status(store: &StateStore, project_id: &ProjectId) -> Option<ProjectStatus> {
    let project = store.project(project_id)?;

    let jobs = store
        .all_jobs(project_id)
        .into_iter()
        .map(|job| {
            let instance = job.instance_id.as_ref().map(|id| InstanceInfo {
                id: id.clone(),
                public_ip: store
                    .instance(id)
                    .map(|i| i.public_ip.clone())
                    .unwrap_or_default(),
            });
            JobStatusEntry {
                frames_rendered: store.frame_count(&job.id),
                start_frame: job.range.start,
                end_frame: job.range.end,
                instance,
                is_active: job.is_active,
                id: job.id,
            }
        })
        .collect();

    Some(ProjectStatus {
        id: project.id.clone(),
        source: project.source.clone(),
        start_frame: project.range.start,
        end_frame: project.range.end,
        software: project.software.clone(),
        output_uri: project.output_uri.clone(),
        is_complete: store.is_project_complete(project_id),
        jobs,
    })
}
