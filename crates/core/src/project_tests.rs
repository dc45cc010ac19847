// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn spec(start: i32, end: i32, fpm: u32) -> ProjectSpec {
    ProjectSpec {
        id: ProjectId::new("castle"),
        source: S3Source::new("scenes", "castle.blend"),
        start_frame: start,
        end_frame: end,
        frames_per_machine: fpm,
        software: SoftwareTag::new("blender"),
        public_ip: "10.0.0.1".to_string(),
    }
}

#[parameterized(
    simple = { 1, 100, 10 },
    single_frame = { 5, 5, 1 },
    negative_frames = { -10, -1, 4 },
)]
fn valid_specs_pass(start: i32, end: i32, fpm: u32) {
    assert!(spec(start, end, fpm).validate().is_ok());
}

#[test]
fn inverted_range_rejected() {
    assert_eq!(
        spec(10, 1, 2).validate(),
        Err(ProjectSpecError::InvertedRange { start: 10, end: 1 })
    );
}

#[test]
fn zero_frames_per_machine_rejected() {
    assert_eq!(
        spec(1, 10, 0).validate(),
        Err(ProjectSpecError::ZeroFramesPerMachine)
    );
}

#[test]
fn project_created_without_output_uri() {
    let project = Project::new(&spec(1, 10, 2), 123);
    assert_eq!(project.range, FrameRange::new(1, 10));
    assert_eq!(project.output_uri, None);
    assert_eq!(project.created_at_ms, 123);
}
