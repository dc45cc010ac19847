// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control protocol for the daemon socket.
//!
//! JSON payloads, field names matching the legacy wire shapes
//! (`startFrame`, `publicIP`, `jobID`, ...).

use drender_core::{
    FrameRecord, InstanceId, JobId, ProjectId, ProjectSpec, RenderInstance, S3Source, SoftwareTag,
};
use drender_engine::ProjectStatus;
use serde::{Deserialize, Serialize};

/// Request from a control client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Start a project or query its status
    Project { request: ProjectRequest },

    /// Health-system verdict or operator action for one instance
    Heartbeat { heartbeat: InstanceHeartbeat },

    /// Frame notification bridged from the broker
    Frame { frame: JobFrameMsg },

    /// Request daemon shutdown
    Shutdown,
}

/// Response from the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Project { response: ProjectResponse },
    Ok,
    Error { message: String },
    ShuttingDown,
}

/// What a project request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectAction {
    Start,
    Status,
}

/// Inbound project control message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<S3Source>,
    #[serde(default)]
    pub start_frame: i32,
    #[serde(default)]
    pub end_frame: i32,
    #[serde(default)]
    pub frames_per_machine: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<SoftwareTag>,
    #[serde(rename = "publicIP", default)]
    pub public_ip: String,
    pub action: ProjectAction,
}

impl ProjectRequest {
    /// Turn a START request into a validated-later driver spec.
    /// Returns `None` when required fields are absent.
    pub fn into_spec(self) -> Option<ProjectSpec> {
        Some(ProjectSpec {
            id: self.id,
            source: self.source?,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            frames_per_machine: self.frames_per_machine,
            software: self.software?,
            public_ip: self.public_ip,
        })
    }
}

/// Recovery action requested for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeartbeatAction {
    StartNewMachine,
    RestartMachine,
    KillMachine,
    HeartbeatCheck,
}

/// Inbound heartbeat control message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceHeartbeat {
    pub instance: RenderInstance,
    pub action: HeartbeatAction,
}

/// Per-frame completion notification, as carried on the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFrameMsg {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    #[serde(rename = "lastFrameRendered")]
    pub last_frame_rendered: i32,
    #[serde(rename = "outputURI", default, skip_serializing_if = "Option::is_none")]
    pub output_uri: Option<S3Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames_rendered: Vec<i32>,
}

impl From<JobFrameMsg> for FrameRecord {
    fn from(msg: JobFrameMsg) -> Self {
        FrameRecord {
            job_id: msg.job_id,
            last_frame_rendered: msg.last_frame_rendered,
            output_uri: msg.output_uri,
            frames_rendered: msg.frames_rendered,
        }
    }
}

/// One job line in a project response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEntry {
    pub id: JobId,
    pub start_frame: i32,
    pub end_frame: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_info: Option<InstanceEntry>,
    pub is_active: bool,
    pub frames_rendered: usize,
}

/// Instance details in a job line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceEntry {
    pub id: InstanceId,
    #[serde(default)]
    pub public_ip: String,
}

/// Job log of a project response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectLog {
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// Outbound project view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<S3Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_frame: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_frame: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<SoftwareTag>,
    #[serde(rename = "outputURI", default, skip_serializing_if = "Option::is_none")]
    pub output_uri: Option<S3Source>,
    pub is_complete: bool,
    #[serde(default)]
    pub log: ProjectLog,
}

impl ProjectResponse {
    /// The empty response returned for an unknown project id.
    pub fn empty(id: ProjectId) -> Self {
        Self {
            id,
            source: None,
            start_frame: None,
            end_frame: None,
            software: None,
            output_uri: None,
            is_complete: false,
            log: ProjectLog::default(),
        }
    }
}

impl From<ProjectStatus> for ProjectResponse {
    fn from(status: ProjectStatus) -> Self {
        Self {
            id: status.id,
            source: Some(status.source),
            start_frame: Some(status.start_frame),
            end_frame: Some(status.end_frame),
            software: Some(status.software),
            output_uri: status.output_uri,
            is_complete: status.is_complete,
            log: ProjectLog {
                jobs: status
                    .jobs
                    .into_iter()
                    .map(|job| JobEntry {
                        id: job.id,
                        start_frame: job.start_frame,
                        end_frame: job.end_frame,
                        instance_info: job.instance.map(|i| InstanceEntry {
                            id: i.id,
                            public_ip: i.public_ip,
                        }),
                        is_active: job.is_active,
                        frames_rendered: job.frames_rendered,
                    })
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
