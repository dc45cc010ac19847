// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project: a user render request spanning a contiguous frame range.

use crate::frames::FrameRange;
use crate::source::S3Source;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a render project, supplied by the caller.
    pub struct ProjectId;
}

/// Name of the rendering software package a project uses.
///
/// Resolved to a cloud machine image through the configured catalog;
/// the driver itself treats the tag as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftwareTag(pub String);

impl SoftwareTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoftwareTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for an inbound project request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectSpecError {
    #[error("end frame {end} precedes start frame {start}")]
    InvertedRange { start: i32, end: i32 },

    #[error("frames per machine must be at least 1")]
    ZeroFramesPerMachine,
}

/// Parameters of a START request, validated before a `Project` is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub id: ProjectId,
    pub source: S3Source,
    pub start_frame: i32,
    pub end_frame: i32,
    pub frames_per_machine: u32,
    pub software: SoftwareTag,
    /// Host of the worker-to-driver broker, taken from the request's
    /// public IP field.
    pub public_ip: String,
}

impl ProjectSpec {
    pub fn validate(&self) -> Result<(), ProjectSpecError> {
        if self.end_frame < self.start_frame {
            return Err(ProjectSpecError::InvertedRange {
                start: self.start_frame,
                end: self.end_frame,
            });
        }
        if self.frames_per_machine == 0 {
            return Err(ProjectSpecError::ZeroFramesPerMachine);
        }
        Ok(())
    }

    pub fn range(&self) -> FrameRange {
        FrameRange::new(self.start_frame, self.end_frame)
    }
}

/// An accepted render project.
///
/// Immutable after creation except for the one-time attachment of the
/// output URI once the bucket exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub source: S3Source,
    pub range: FrameRange,
    pub frames_per_machine: u32,
    pub software: SoftwareTag,
    pub output_uri: Option<S3Source>,
    pub created_at_ms: u64,
}

impl Project {
    pub fn new(spec: &ProjectSpec, epoch_ms: u64) -> Self {
        Self {
            id: spec.id.clone(),
            source: spec.source.clone(),
            range: spec.range(),
            frames_per_machine: spec.frames_per_machine,
            software: spec.software.clone(),
            output_uri: None,
            created_at_ms: epoch_ms,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
