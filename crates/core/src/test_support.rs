// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders for other crates' tests. Compiled only for tests or with
//! the `test-support` feature.

use crate::broker::BrokerAddress;
use crate::instance::RenderInstance;
use crate::project::{ProjectId, ProjectSpec, SoftwareTag};
use crate::source::S3Source;

/// A valid START spec over `[start..end]` with the given chunk size.
pub fn project_spec(id: &str, start: i32, end: i32, frames_per_machine: u32) -> ProjectSpec {
    ProjectSpec {
        id: ProjectId::new(id),
        source: S3Source::new("scenes", format!("{id}.blend")),
        start_frame: start,
        end_frame: end,
        frames_per_machine,
        software: SoftwareTag::new("blender"),
        public_ip: "10.0.0.1".to_string(),
    }
}

/// A running instance with a predictable IP.
pub fn instance(id: &str) -> RenderInstance {
    RenderInstance::new(id, format!("192.0.2.{}", id.len()), "ami-blender")
}

/// Broker coordinates matching `project_spec`'s public IP.
pub fn broker() -> BrokerAddress {
    BrokerAddress::new("10.0.0.1")
}
